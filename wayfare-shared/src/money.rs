use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Monetary amounts are carried to two decimal places.
pub const DECIMAL_PLACES: u32 = 2;

/// Round a monetary amount to two decimal places, midpoints away from zero.
#[inline]
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a rating average to one decimal place, midpoints away from zero.
#[inline]
pub fn round1(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a major-unit amount to minor units (x100) for gateways that
/// only accept integral amounts.
#[inline]
pub fn to_minor_units(value: Decimal) -> i64 {
    (value * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or_default()
}

/// Convert a minor-unit amount back to major units.
#[inline]
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, DECIMAL_PLACES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn round2_midpoint_goes_away_from_zero() {
        let v = Decimal::from_str("1.005").unwrap();
        assert_eq!(round2(v), Decimal::from_str("1.01").unwrap());
    }

    #[test]
    fn round2_truncates_repeating_thirds() {
        let v = Decimal::from_str("333333.3333333").unwrap();
        assert_eq!(round2(v), Decimal::from_str("333333.33").unwrap());
    }

    #[test]
    fn round1_single_place() {
        let v = Decimal::from_str("4.25").unwrap();
        assert_eq!(round1(v), Decimal::from_str("4.3").unwrap());
    }

    #[test]
    fn minor_units_round_trip() {
        let amount = Decimal::from_str("2333333.33").unwrap();
        assert_eq!(to_minor_units(amount), 233_333_333);
        assert_eq!(from_minor_units(233_333_333), amount);
    }

    #[test]
    fn minor_units_whole_amount() {
        let amount = Decimal::from(2_000_000);
        assert_eq!(to_minor_units(amount), 200_000_000);
    }
}
