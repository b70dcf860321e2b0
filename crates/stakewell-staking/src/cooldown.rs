// crates/stakewell-staking/src/cooldown.rs
//
// Cooldown state machine for redemptions.
//
// A staker's cooldown is a single timestamp (0 = never activated):
//
//   Inactive    timestamp == 0
//   Pending     now <  t + cooldown
//   Redeemable  t + cooldown <= now < t + cooldown + window
//   Expired     now >= t + cooldown + window
//
// Expired behaves like Inactive for redemption, but the stale timestamp stays
// stored until something overwrites it.

use serde::{Deserialize, Serialize};

use stakewell_core::math::weighted_mean;
use stakewell_core::{Amount, CooldownError, StakewellError, Timestamp};

/// Where a staker stands in the redemption cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CooldownState {
    Inactive,
    Pending { redeemable_at: Timestamp },
    Redeemable { window_ends_at: Timestamp },
    Expired,
}

impl CooldownState {
    /// Pending or Redeemable.
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            CooldownState::Pending { .. } | CooldownState::Redeemable { .. }
        )
    }
}

/// Cooldown and unstake-window durations of one staking ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownPolicy {
    pub cooldown_seconds: Timestamp,
    pub unstake_window: Timestamp,
}

impl CooldownPolicy {
    pub fn new(cooldown_seconds: Timestamp, unstake_window: Timestamp) -> Self {
        Self {
            cooldown_seconds,
            unstake_window,
        }
    }

    /// Classify a stored cooldown timestamp at `now`.
    pub fn state(&self, timestamp: Timestamp, now: Timestamp) -> CooldownState {
        if timestamp == 0 {
            return CooldownState::Inactive;
        }
        let redeemable_at = timestamp.saturating_add(self.cooldown_seconds);
        let window_ends_at = redeemable_at.saturating_add(self.unstake_window);
        if now < redeemable_at {
            CooldownState::Pending { redeemable_at }
        } else if now < window_ends_at {
            CooldownState::Redeemable { window_ends_at }
        } else {
            CooldownState::Expired
        }
    }

    /// Succeeds only inside the unstake window.
    pub fn check_redeemable(&self, timestamp: Timestamp, now: Timestamp) -> Result<(), CooldownError> {
        match self.state(timestamp, now) {
            CooldownState::Redeemable { .. } => Ok(()),
            CooldownState::Pending { redeemable_at } => {
                Err(CooldownError::InsufficientCooldown { redeemable_at })
            }
            CooldownState::Inactive | CooldownState::Expired => {
                Err(CooldownError::UnstakeWindowFinished)
            }
        }
    }

    /// Recipient's cooldown after `amount` is staked on top of `balance`.
    ///
    /// A live cooldown is pushed toward `now` in proportion to the new stake:
    /// `(amount * now + balance * previous) / (balance + amount)`. An inactive
    /// or expired cooldown is dropped, so staking never starts a cooldown.
    pub fn after_stake(
        &self,
        previous: Timestamp,
        balance: Amount,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Timestamp, StakewellError> {
        if !self.state(previous, now).is_live() {
            return Ok(0);
        }
        if balance == 0 && amount == 0 {
            return Ok(previous);
        }
        let overflow = || StakewellError::ArithmeticOverflow("cooldown weighting overflows".to_string());
        let merged =
            weighted_mean(now as Amount, amount, previous as Amount, balance).ok_or_else(overflow)?;
        // A weighted mean of two timestamps always fits back into one.
        Timestamp::try_from(merged).map_err(|_| overflow())
    }

    /// Recipient's cooldown after receiving staked balance from a sender.
    ///
    /// An expired recipient cooldown is cleared first. A live sender cooldown
    /// then replaces the recipient's when the recipient has none or an older
    /// one; otherwise the recipient keeps its own.
    pub fn after_receive(&self, sender: Timestamp, recipient: Timestamp, now: Timestamp) -> Timestamp {
        let recipient = match self.state(recipient, now) {
            CooldownState::Expired => 0,
            _ => recipient,
        };
        if self.state(sender, now).is_live() && (recipient == 0 || recipient < sender) {
            sender
        } else {
            recipient
        }
    }
}
