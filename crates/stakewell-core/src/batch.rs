// crates/stakewell-core/src/batch.rs
//
// Atomic batches of token movements.
//
// A component that needs several ledger writes for one call (pull the
// underlying, mint the share, ...) records them in a `LedgerBatch` and
// commits once. The batch is replayed against a simulated balance sheet
// first, so an insufficient balance or an overflow anywhere in the batch
// is reported before the real ledger sees a single write.

use std::collections::HashMap;

use crate::error::StakewellError;
use crate::traits::TokenLedger;
use crate::types::{Address, Amount};
use crate::Result;

/// A single token movement.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LedgerOp {
    Transfer {
        token: Address,
        from: Address,
        to: Address,
        amount: Amount,
    },
    Mint {
        token: Address,
        to: Address,
        amount: Amount,
    },
    Burn {
        token: Address,
        from: Address,
        amount: Amount,
    },
}

/// Ordered list of token movements committed all-or-nothing.
#[derive(Debug, Clone, Default)]
pub struct LedgerBatch {
    ops: Vec<LedgerOp>,
}

/// Balances touched by a batch, seeded lazily from the real ledger.
struct SimulatedSheet<'a> {
    ledger: &'a dyn TokenLedger,
    balances: HashMap<(Address, Address), Amount>,
    supplies: HashMap<Address, Amount>,
}

impl<'a> SimulatedSheet<'a> {
    fn new(ledger: &'a dyn TokenLedger) -> Self {
        Self {
            ledger,
            balances: HashMap::new(),
            supplies: HashMap::new(),
        }
    }

    fn balance(&mut self, token: &Address, account: &Address) -> &mut Amount {
        let ledger = self.ledger;
        self.balances
            .entry((*token, *account))
            .or_insert_with(|| ledger.balance_of(token, account))
    }

    fn supply(&mut self, token: &Address) -> &mut Amount {
        let ledger = self.ledger;
        self.supplies
            .entry(*token)
            .or_insert_with(|| ledger.total_supply(token))
    }

    fn debit(&mut self, token: &Address, account: &Address, amount: Amount) -> Result<()> {
        let balance = self.balance(token, account);
        if *balance < amount {
            return Err(StakewellError::InsufficientBalance {
                token: *token,
                account: *account,
                required: amount,
                available: *balance,
            });
        }
        *balance -= amount;
        Ok(())
    }

    fn credit(&mut self, token: &Address, account: &Address, amount: Amount) -> Result<()> {
        let balance = self.balance(token, account);
        *balance = balance.checked_add(amount).ok_or_else(|| {
            StakewellError::ArithmeticOverflow(format!("balance of {} overflows", account))
        })?;
        Ok(())
    }

    fn apply(&mut self, op: &LedgerOp) -> Result<()> {
        match op {
            LedgerOp::Transfer {
                token,
                from,
                to,
                amount,
            } => {
                self.debit(token, from, *amount)?;
                self.credit(token, to, *amount)
            }
            LedgerOp::Mint { token, to, amount } => {
                let supply = self.supply(token);
                *supply = supply.checked_add(*amount).ok_or_else(|| {
                    StakewellError::ArithmeticOverflow(format!("supply of {} overflows", token))
                })?;
                self.credit(token, to, *amount)
            }
            LedgerOp::Burn {
                token,
                from,
                amount,
            } => {
                self.debit(token, from, *amount)?;
                let supply = self.supply(token);
                *supply = supply.saturating_sub(*amount);
                Ok(())
            }
        }
    }
}

impl LedgerBatch {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    pub fn transfer(mut self, token: Address, from: Address, to: Address, amount: Amount) -> Self {
        self.ops.push(LedgerOp::Transfer {
            token,
            from,
            to,
            amount,
        });
        self
    }

    pub fn mint(mut self, token: Address, to: Address, amount: Amount) -> Self {
        self.ops.push(LedgerOp::Mint { token, to, amount });
        self
    }

    pub fn burn(mut self, token: Address, from: Address, amount: Amount) -> Self {
        self.ops.push(LedgerOp::Burn {
            token,
            from,
            amount,
        });
        self
    }

    /// Replay the batch against a simulated copy of the touched balances.
    ///
    /// Returns the first error any op would hit, without writing anything.
    pub fn check(&self, ledger: &dyn TokenLedger) -> Result<()> {
        let mut sheet = SimulatedSheet::new(ledger);
        for op in &self.ops {
            sheet.apply(op)?;
        }
        Ok(())
    }

    /// Check, then apply every op to the real ledger in order.
    pub fn commit(self, ledger: &mut dyn TokenLedger) -> Result<()> {
        self.check(&*ledger)?;
        for op in self.ops {
            match op {
                LedgerOp::Transfer {
                    token,
                    from,
                    to,
                    amount,
                } => ledger.transfer(&token, &from, &to, amount)?,
                LedgerOp::Mint { token, to, amount } => ledger.mint(&token, &to, amount)?,
                LedgerOp::Burn {
                    token,
                    from,
                    amount,
                } => ledger.burn(&token, &from, amount)?,
            }
        }
        Ok(())
    }
}
