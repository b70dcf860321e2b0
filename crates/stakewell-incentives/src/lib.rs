// crates/stakewell-incentives/src/lib.rs
//
// stakewell-incentives: the multi-asset incentives controller.
//
// External asset ledgers notify the controller whenever a user's balance
// changes; the controller settles the user's rewards against the asset's
// distribution index and accumulates them until claimed. Claims can be paid
// out directly or restaked through the staking ledger with a premium.

pub mod config;
pub mod controller;

pub use config::IncentivesConfig;
pub use controller::{ClaimRequest, IncentivesController, IncentivesState};
