// crates/stakewell-core/src/events.rs
//
// Notifications emitted by successful state transitions.
//
// Components buffer these while a call is staged and publish them only once
// the call has committed, so a failed call never leaves an event behind.

use serde::{Deserialize, Serialize};

use crate::types::{Address, Amount, AssetId};

/// Events emitted by the distribution engine, the incentives controller,
/// and the staking ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolEvent {
    /// Emission rate of an asset was (re)configured.
    AssetConfigUpdated {
        asset: AssetId,
        emission_per_second: Amount,
    },
    /// The global index of an asset moved.
    AssetIndexUpdated { asset: AssetId, index: Amount },
    /// A user's snapshot of an asset index was refreshed.
    UserIndexUpdated {
        user: Address,
        asset: AssetId,
        index: Amount,
    },
    /// Rewards were settled into a user's unclaimed balance.
    RewardsAccrued { user: Address, amount: Amount },
    /// Rewards left the vault for `to` (amount includes any staking premium).
    RewardsClaimed {
        from: Address,
        to: Address,
        amount: Amount,
    },
    /// Underlying tokens were staked.
    Staked {
        from: Address,
        on_behalf_of: Address,
        amount: Amount,
    },
    /// Staked tokens were redeemed for the underlying.
    Redeem {
        from: Address,
        to: Address,
        amount: Amount,
    },
    /// A staker activated their cooldown.
    Cooldown { user: Address },
}
