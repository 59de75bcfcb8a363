//! Conversions between decimal amounts and stored minor currency units.
//!
//! Prices are persisted as integer minor units so totals never pick up floating
//! point error; callers work with `Decimal` on both sides of that boundary.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Number of decimal places represented by one minor unit.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Converts stored minor units back to a decimal amount.
#[must_use]
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, MINOR_UNIT_SCALE)
}

/// Converts a non-negative decimal amount to minor units.
///
/// # Errors
/// Returns `InvalidAmount` if the amount is negative, has more than two decimal
/// places, or does not fit in an `i64`.
pub fn to_minor_units(amount: Decimal) -> Result<i64> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(Error::InvalidAmount { amount });
    }

    let scaled = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or(Error::InvalidAmount { amount })?;
    if !scaled.fract().is_zero() {
        return Err(Error::InvalidAmount { amount });
    }

    scaled.to_i64().ok_or(Error::InvalidAmount { amount })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_to_minor_units() {
        assert_eq!(to_minor_units(Decimal::new(1999, 2)).unwrap(), 1999);
        assert_eq!(to_minor_units(Decimal::from(25)).unwrap(), 2500);
        assert_eq!(to_minor_units(Decimal::from_str("0.5").unwrap()).unwrap(), 50);
        assert_eq!(to_minor_units(Decimal::ZERO).unwrap(), 0);
        // Trailing zeros beyond the minor unit are fine
        assert_eq!(to_minor_units(Decimal::from_str("3.100").unwrap()).unwrap(), 310);
    }

    #[test]
    fn test_to_minor_units_rejects_invalid_amounts() {
        assert!(matches!(
            to_minor_units(Decimal::new(-1, 2)),
            Err(Error::InvalidAmount { .. })
        ));
        assert!(matches!(
            to_minor_units(Decimal::from_str("1.005").unwrap()),
            Err(Error::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_from_minor_units() {
        assert_eq!(from_minor_units(2500), Decimal::from(25));
        assert_eq!(from_minor_units(1).to_string(), "0.01");
    }
}
