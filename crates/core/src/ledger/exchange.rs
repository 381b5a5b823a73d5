//! Exchange rate derivation.

use rust_decimal::{Decimal, RoundingStrategy};

use super::error::LedgerError;

/// Fractional digits stored for an exchange rate.
pub const RATE_SCALE: u32 = 6;

/// Derives `to_amount / from_amount`, rounded half away from zero to six places.
///
/// # Errors
///
/// Returns `NonPositiveAmount` if either side is not strictly positive.
pub fn exchange_rate(from_amount: Decimal, to_amount: Decimal) -> Result<Decimal, LedgerError> {
    if from_amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount {
            field: "from_amount",
            amount: from_amount,
        });
    }
    if to_amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount {
            field: "to_amount",
            amount: to_amount,
        });
    }
    let rate = to_amount
        .checked_div(from_amount)
        .ok_or_else(|| LedgerError::InvariantViolation("exchange rate overflow".to_string()))?;
    let mut rate = rate.round_dp_with_strategy(RATE_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rate.rescale(RATE_SCALE);
    Ok(rate)
}
