// crates/stakewell-distribution/src/index.rs
//
// Pure index math.
//
// Normalized linear distribution: an asset emits `emission_per_second`
// reward units every second until `distribution_end`, pooled across
// `total_balance` units of stake. The index accumulates reward-per-unit in
// 18-decimal fixed point:
//
//   index' = index + (elapsed * emission_per_second) * 10^18 / total_balance
//
// and a user's reward for an interval is
//
//   reward = principal * (index' - user_index) / 10^18

use stakewell_core::math::{checked_add, checked_sub, mul_div_floor};
use stakewell_core::{Amount, Result, StakewellError, Timestamp, WAD};

/// Advance an asset index from `last_update` to `now`.
///
/// Returns `current_index` unchanged when nothing is staked, nothing is
/// emitted, or the distribution already ended before the last update.
/// Time past `distribution_end` never accrues.
pub fn normalized_index(
    current_index: Amount,
    emission_per_second: Amount,
    last_update: Timestamp,
    now: Timestamp,
    distribution_end: Timestamp,
    total_balance: Amount,
) -> Result<Amount> {
    if total_balance == 0 || emission_per_second == 0 || last_update >= distribution_end {
        return Ok(current_index);
    }

    let effective_now = now.min(distribution_end);
    // Only a misordered caller can pass `now < last_update`; accrue nothing.
    let elapsed = effective_now.saturating_sub(last_update) as Amount;

    let linear_reward = elapsed.checked_mul(emission_per_second).ok_or_else(|| {
        StakewellError::ArithmeticOverflow(format!(
            "{}s at {}/s overflows the linear reward",
            elapsed, emission_per_second
        ))
    })?;
    let increment = mul_div_floor(linear_reward, WAD, total_balance)?;
    checked_add(current_index, increment)
}

/// Reward accrued by `principal` while the index moved from `user_index`
/// to `asset_index`.
pub fn user_rewards(principal: Amount, asset_index: Amount, user_index: Amount) -> Result<Amount> {
    let delta = checked_sub(asset_index, user_index)?;
    mul_div_floor(principal, delta, WAD)
}

/// Settle a user against a freshly updated index.
///
/// Returns `(accrued_reward, new_user_index)`. `principal` must be the
/// balance that was in effect during the elapsed interval, i.e. read before
/// the action that triggered the settlement changes it.
pub fn settle_user(
    principal: Amount,
    user_index: Amount,
    fresh_index: Amount,
) -> Result<(Amount, Amount)> {
    let accrued = user_rewards(principal, fresh_index, user_index)?;
    Ok((accrued, fresh_index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const HOUR: Timestamp = 3_600;
    const END: Timestamp = 1_000_000;

    #[test]
    fn test_index_accrues_linearly() {
        // 100/s for an hour over 2 tokens: 180_000 per whole token
        let idx = normalized_index(0, 100, 0, HOUR, END, 2 * WAD).unwrap();
        assert_eq!(idx, 180_000);
    }

    #[test]
    fn test_zero_total_balance_keeps_index() {
        assert_eq!(normalized_index(42, 100, 0, HOUR, END, 0).unwrap(), 42);
    }

    #[test]
    fn test_zero_emission_keeps_index() {
        assert_eq!(normalized_index(42, 0, 0, HOUR, END, WAD).unwrap(), 42);
    }

    #[test]
    fn test_index_clamped_at_distribution_end() {
        let at_end = normalized_index(0, 10, 0, END, END, WAD).unwrap();
        let past_end = normalized_index(0, 10, 0, END + 10 * HOUR, END, WAD).unwrap();
        assert_eq!(at_end, past_end);
        assert_eq!(at_end, 10 * END as Amount);
    }

    #[test]
    fn test_update_after_end_is_frozen() {
        assert_eq!(normalized_index(7, 10, END, END + HOUR, END, WAD).unwrap(), 7);
        assert_eq!(normalized_index(7, 10, END + 1, END + HOUR, END, WAD).unwrap(), 7);
    }

    #[test]
    fn test_backwards_time_accrues_nothing() {
        assert_eq!(normalized_index(5, 10, HOUR, 0, END, WAD).unwrap(), 5);
    }

    #[test]
    fn test_token_scale_emission_over_a_day() {
        // One token per second for a day over 1_000 tokens.
        let idx = normalized_index(0, WAD, 0, 86_400, END, 1_000 * WAD).unwrap();
        assert_eq!(idx, 86_400 * WAD / 1_000);
        assert_eq!(user_rewards(1_000 * WAD, idx, 0).unwrap(), 86_400 * WAD);
    }

    #[test]
    fn test_index_overflow_is_error() {
        let result = normalized_index(0, u128::MAX, 0, 2, END, 1);
        assert!(matches!(result, Err(StakewellError::ArithmeticOverflow(_))));
    }

    #[test]
    fn test_user_rewards_exact() {
        // 1 token held while the index moved by 180_000
        assert_eq!(user_rewards(WAD, 180_000, 0).unwrap(), 180_000);
        // Half a token truncates toward zero
        assert_eq!(user_rewards(WAD / 2, 3, 0).unwrap(), 1);
    }

    #[test]
    fn test_user_rewards_zero_principal() {
        assert_eq!(user_rewards(0, 1_000_000, 0).unwrap(), 0);
    }

    #[test]
    fn test_settle_user_returns_fresh_index() {
        let (accrued, idx) = settle_user(2 * WAD, 100, 150).unwrap();
        assert_eq!(accrued, 100);
        assert_eq!(idx, 150);
    }

    #[test]
    fn test_settle_user_stale_fresh_index_is_error() {
        assert!(settle_user(WAD, 10, 5).is_err());
    }

    proptest! {
        #[test]
        fn index_is_non_decreasing(
            start in 0u128..1_000_000_000 * WAD,
            eps in 0u128..1_000 * WAD,
            last in 0u64..END,
            dt in 0u64..=END,
            total in WAD..1_000_000 * WAD,
        ) {
            let next = normalized_index(start, eps, last, last + dt, END, total).unwrap();
            prop_assert!(next >= start);
        }

        #[test]
        fn index_frozen_after_end(
            eps in 1u128..1_000 * WAD,
            last in 0u64..END,
            extra in 0u64..END,
            total in WAD..1_000_000 * WAD,
        ) {
            let at_end = normalized_index(0, eps, last, END, END, total).unwrap();
            let later = normalized_index(0, eps, last, END + extra, END, total).unwrap();
            prop_assert_eq!(at_end, later);
        }

        #[test]
        fn settlement_matches_formula(
            principal in 0u128..1_000_000_000_000 * WAD,
            user_index in 0u128..1_000_000_000_000 * WAD,
            delta in 0u128..100 * WAD,
        ) {
            let fresh = user_index + delta;
            let (accrued, idx) = settle_user(principal, user_index, fresh).unwrap();
            // floor(principal * delta / WAD) without leaving u128
            let expected = (principal / WAD) * delta + (principal % WAD) * delta / WAD;
            prop_assert_eq!(accrued, expected);
            prop_assert_eq!(idx, fresh);
        }
    }
}
