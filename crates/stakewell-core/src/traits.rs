// crates/stakewell-core/src/traits.rs

use crate::error::StakewellError;
use crate::types::{Address, Amount, Timestamp};

/// Fungible-token ledger consumed by the engine.
///
/// Implemented by stakewell-ledger (in-memory backend). The engine never
/// touches allowances or signatures; it only reads balances and moves,
/// mints, or burns tokens on accounts it has been authorized to act for.
pub trait TokenLedger {
    /// Balance of `account` in `token`.
    fn balance_of(&self, token: &Address, account: &Address) -> Amount;

    /// Total supply of `token`.
    fn total_supply(&self, token: &Address) -> Amount;

    /// Move `amount` of `token` from `from` to `to`.
    fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), StakewellError>;

    /// Create `amount` of `token` on `to`.
    fn mint(&mut self, token: &Address, to: &Address, amount: Amount) -> Result<(), StakewellError>;

    /// Destroy `amount` of `token` held by `from`.
    fn burn(&mut self, token: &Address, from: &Address, amount: Amount)
        -> Result<(), StakewellError>;
}

/// Authorization check for privileged configuration calls.
pub trait AccessPolicy {
    /// Returns `true` if `caller` may reconfigure emissions.
    fn is_emission_manager(&self, caller: &Address) -> bool;
}

/// The default policy: exactly one address holds the emission-manager role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmissionManagerPolicy {
    pub manager: Address,
}

impl AccessPolicy for EmissionManagerPolicy {
    fn is_emission_manager(&self, caller: &Address) -> bool {
        *caller == self.manager
    }
}

/// Stake-deposit entry point of a staking ledger.
///
/// Implemented by stakewell-staking. The incentives controller routes
/// claim-to-stake payouts through this trait without depending on the
/// staking crate directly.
pub trait StakingGateway {
    /// The token the gateway pulls from `caller` when staking.
    fn staked_token(&self) -> Address;

    /// Stake `amount` on behalf of `on_behalf_of`, pulling the underlying
    /// token from `caller`. Must leave no state modified on error.
    fn stake(
        &mut self,
        ledger: &mut dyn TokenLedger,
        caller: &Address,
        on_behalf_of: &Address,
        amount: Amount,
        now: Timestamp,
    ) -> Result<(), StakewellError>;
}
