use thiserror::Error;

use crate::types::{Address, Amount, Timestamp};

/// Why a redeem was rejected by the cooldown state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CooldownError {
    /// The staker never activated a cooldown, or its unstake window lapsed.
    #[error("unstake window finished")]
    UnstakeWindowFinished,

    /// The cooldown is still running; redemption opens at `redeemable_at`.
    #[error("insufficient cooldown: redeemable at {redeemable_at}")]
    InsufficientCooldown { redeemable_at: Timestamp },
}

/// Protocol-wide error types for the Stakewell engine.
///
/// Every failure is an all-or-nothing call failure: when an operation
/// returns one of these, no tracked field has been modified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StakewellError {
    /// Stake or redeem called with a zero amount.
    #[error("Invalid zero amount")]
    ZeroAmount,

    /// Caller lacks the role required for the operation.
    #[error("Unauthorized: {caller} is not the {role}")]
    Unauthorized { caller: Address, role: &'static str },

    /// Redeem attempted outside the redemption window.
    #[error("Invalid cooldown state: {0}")]
    InvalidCooldownState(#[from] CooldownError),

    /// Cooldown activated with nothing staked.
    #[error("Invalid balance on cooldown")]
    InvalidBalanceOnCooldown,

    /// Claim exceeds the caller's settled reward balance.
    #[error("Invalid claim amount: requested {requested} but only {available} available")]
    InvalidClaimAmount { requested: Amount, available: Amount },

    /// Checked arithmetic failed. Fatal for the call.
    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    /// Raised by the token ledger when an account cannot cover a debit.
    #[error("Insufficient balance of {token} for {account}: required {required}, available {available}")]
    InsufficientBalance {
        token: Address,
        account: Address,
        required: Amount,
        available: Amount,
    },

    /// Initialization attempted on state already at the current revision.
    #[error("Already initialized at revision {revision}")]
    AlreadyInitialized { revision: u32 },

    /// Snapshot written by a newer, unknown schema revision.
    #[error("Unsupported revision {found}; this build supports up to {supported}")]
    UnsupportedRevision { found: u32, supported: u32 },

    /// Configuration error (bad address, missing field, invalid value).
    #[error("Config error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StakewellError {
    fn from(e: serde_json::Error) -> Self {
        StakewellError::Serialization(e.to_string())
    }
}
