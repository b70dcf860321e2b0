// crates/stakewell-core/src/math.rs
//
// 18-decimal fixed-point ("wad") helpers.
//
// All index and reward arithmetic multiplies before dividing and truncates
// toward zero. Products are formed in 256 bits, so only a result that does
// not fit back into `Amount` surfaces as `StakewellError::ArithmeticOverflow`.

use primitive_types::U256;

use crate::error::StakewellError;
use crate::types::Amount;
use crate::Result;

/// Fixed-point scale for indexes: 10^18.
pub const WAD: Amount = 1_000_000_000_000_000_000;

/// Scale for percentage parameters: a premium of `2` means 2%.
pub const PERCENTAGE_SCALE: Amount = 100;

/// `floor(a * b / denom)` with a 256-bit intermediate product.
///
/// `denom` must be non-zero; a zero denominator is reported as overflow
/// since it can only arise from a broken invariant upstream.
pub fn mul_div_floor(a: Amount, b: Amount, denom: Amount) -> Result<Amount> {
    if denom == 0 {
        return Err(StakewellError::ArithmeticOverflow(
            "division by zero".to_string(),
        ));
    }
    // (2^128 - 1)^2 < 2^256
    let quotient = U256::from(a) * U256::from(b) / U256::from(denom);
    narrow(quotient).ok_or_else(|| {
        StakewellError::ArithmeticOverflow(format!("{} * {} / {} overflows u128", a, b, denom))
    })
}

/// Weighted mean `(a * weight_a + b * weight_b) / (weight_a + weight_b)`,
/// floored. Returns `None` when both weights are zero or the weighted sum
/// leaves 256 bits.
pub fn weighted_mean(a: Amount, weight_a: Amount, b: Amount, weight_b: Amount) -> Option<Amount> {
    let total = U256::from(weight_a) + U256::from(weight_b);
    if total.is_zero() {
        return None;
    }
    let sum = (U256::from(a) * U256::from(weight_a)).checked_add(U256::from(b) * U256::from(weight_b))?;
    // Never exceeds max(a, b).
    narrow(sum / total)
}

fn narrow(value: U256) -> Option<Amount> {
    if value > U256::from(Amount::MAX) {
        None
    } else {
        Some(value.low_u128())
    }
}

pub fn checked_add(a: Amount, b: Amount) -> Result<Amount> {
    a.checked_add(b)
        .ok_or_else(|| StakewellError::ArithmeticOverflow(format!("{} + {} overflows u128", a, b)))
}

pub fn checked_sub(a: Amount, b: Amount) -> Result<Amount> {
    a.checked_sub(b)
        .ok_or_else(|| StakewellError::ArithmeticOverflow(format!("{} - {} underflows", a, b)))
}

/// Amount plus a percentage bonus: `amount + amount * percent / 100`.
pub fn with_premium(amount: Amount, percent: Amount) -> Result<Amount> {
    let premium = mul_div_floor(amount, percent, PERCENTAGE_SCALE)?;
    checked_add(amount, premium)
}
