/// Conversion between raw token units and decimal amounts
///
/// Every amount read from the ledger is an integer in the token's smallest
/// unit. The same precision must be applied to the balance and to every
/// flow amount of a position, so callers pass one `decimals` value through
/// the whole reduction.
use rust_decimal::Decimal;

use crate::{MathError, MathResult};

/// Largest scale supported by `rust_decimal`
pub const MAX_DECIMALS: u32 = 28;

/// Seconds in the 365-day year used for annualization
pub const SECONDS_PER_YEAR: i64 = 365 * SECONDS_PER_DAY;

/// Seconds in one day
pub const SECONDS_PER_DAY: i64 = 24 * 3600;

/// Convert a raw smallest-unit amount into a decimal amount
pub fn to_decimal(raw: u128, decimals: u32) -> MathResult<Decimal> {
    if decimals > MAX_DECIMALS {
        return Err(MathError::DecimalsOutOfRange {
            decimals,
            max: MAX_DECIMALS,
        });
    }

    let value = i128::try_from(raw).map_err(|_| MathError::AmountOutOfRange { raw, decimals })?;

    Decimal::try_from_i128_with_scale(value, decimals)
        .map_err(|_| MathError::AmountOutOfRange { raw, decimals })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_six_decimal_conversion() {
        assert_eq!(to_decimal(1_000_000, 6).unwrap(), Decimal::ONE);
        assert_eq!(to_decimal(100_000, 6).unwrap(), Decimal::new(1, 1));
        assert_eq!(to_decimal(0, 6).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_eighteen_decimal_conversion() {
        let raw = 2_500_000_000_000_000_000u128;
        assert_eq!(to_decimal(raw, 18).unwrap(), Decimal::new(25, 1));
    }

    #[test]
    fn test_precision_limit() {
        assert_eq!(
            to_decimal(1, 29),
            Err(MathError::DecimalsOutOfRange { decimals: 29, max: 28 })
        );
    }

    #[test]
    fn test_amount_beyond_mantissa() {
        assert!(matches!(
            to_decimal(u128::MAX, 6),
            Err(MathError::AmountOutOfRange { .. })
        ));
    }
}
