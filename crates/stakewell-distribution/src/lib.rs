// crates/stakewell-distribution/src/lib.rs
//
// stakewell-distribution: the distribution index engine shared by the
// incentives controller and the staking ledger.
//
// An asset's index is the time-integral of its emission rate divided by the
// total balance staked in it. A user's pending reward is their principal
// multiplied by how far the index moved since their last snapshot.

pub mod index;
pub mod manager;

// Re-export key types for ergonomic access from downstream crates.
pub use index::{normalized_index, settle_user, user_rewards};
pub use manager::{
    AssetConfigInput, AssetState, DistributionChanges, DistributionManager, StagedDistribution,
    UserStakeInput,
};
