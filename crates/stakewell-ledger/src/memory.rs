// crates/stakewell-ledger/src/memory.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use stakewell_core::math::{checked_add, checked_sub};
use stakewell_core::{Address, Amount, Result, StakewellError, TokenLedger};

/// Balances and supplies of any number of tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryLedger {
    /// token -> account -> balance
    balances: BTreeMap<Address, BTreeMap<Address, Amount>>,
    supplies: BTreeMap<Address, Amount>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn debit(&mut self, token: &Address, account: &Address, amount: Amount) -> Result<()> {
        let available = self.balance_of(token, account);
        if available < amount {
            return Err(StakewellError::InsufficientBalance {
                token: *token,
                account: *account,
                required: amount,
                available,
            });
        }
        self.balances
            .entry(*token)
            .or_default()
            .insert(*account, available - amount);
        Ok(())
    }

    fn credit(&mut self, token: &Address, account: &Address, amount: Amount) -> Result<()> {
        let balance = checked_add(self.balance_of(token, account), amount)?;
        self.balances
            .entry(*token)
            .or_default()
            .insert(*account, balance);
        Ok(())
    }
}

impl TokenLedger for InMemoryLedger {
    fn balance_of(&self, token: &Address, account: &Address) -> Amount {
        self.balances
            .get(token)
            .and_then(|accounts| accounts.get(account))
            .copied()
            .unwrap_or(0)
    }

    fn total_supply(&self, token: &Address) -> Amount {
        self.supplies.get(token).copied().unwrap_or(0)
    }

    fn transfer(&mut self, token: &Address, from: &Address, to: &Address, amount: Amount) -> Result<()> {
        // Validate the credit before the debit lands.
        if from != to {
            checked_add(self.balance_of(token, to), amount)?;
        }
        self.debit(token, from, amount)?;
        self.credit(token, to, amount)?;
        tracing::trace!("{}: {} -> {} ({})", token, from, to, amount);
        Ok(())
    }

    fn mint(&mut self, token: &Address, to: &Address, amount: Amount) -> Result<()> {
        let supply = checked_add(self.total_supply(token), amount)?;
        self.credit(token, to, amount)?;
        self.supplies.insert(*token, supply);
        Ok(())
    }

    fn burn(&mut self, token: &Address, from: &Address, amount: Amount) -> Result<()> {
        self.debit(token, from, amount)?;
        let supply = checked_sub(self.total_supply(token), amount)?;
        self.supplies.insert(*token, supply);
        Ok(())
    }
}
