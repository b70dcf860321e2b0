// crates/stakewell-staking/src/lib.rs
//
// stakewell-staking: the staking ledger.
//
// Stakers deposit the underlying token and receive a staked balance that
// earns rewards from the ledger's own distribution index. Redemption is
// gated by a cooldown followed by a bounded unstake window.

pub mod config;
pub mod cooldown;
pub mod staked_token;

pub use config::StakingConfig;
pub use cooldown::{CooldownPolicy, CooldownState};
pub use staked_token::{StakedToken, StakingState};
