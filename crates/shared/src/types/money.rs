//! Two-decimal fixed-point arithmetic for money and coffee weights.
//!
//! CRITICAL: Never use floating-point for amounts or quantities.
//! Every intermediate value is rounded to two places with
//! round-half-away-from-zero, so chained additions and subtractions never
//! drift from what an operator would compute by hand.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Number of decimal places carried by every amount and quantity.
pub const SCALE: u32 = 2;

/// Errors produced when reading a fixed-point value from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FixedParseError {
    /// The input is not a decimal number.
    #[error("'{0}' is not a valid decimal amount")]
    Unparsable(String),

    /// The input parsed but is zero or negative.
    #[error("amount must be positive, got {0}")]
    NotPositive(Decimal),
}

/// Rounds to two decimals, half away from zero.
#[must_use]
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Adds two values and rounds the result.
#[must_use]
pub fn add(a: Decimal, b: Decimal) -> Decimal {
    round2(a + b)
}

/// Subtracts `b` from `a` and rounds the result.
#[must_use]
pub fn sub(a: Decimal, b: Decimal) -> Decimal {
    round2(a - b)
}

/// Multiplies two values (typically quantity × unit price) and rounds.
#[must_use]
pub fn mul(a: Decimal, b: Decimal) -> Decimal {
    round2(a * b)
}

/// Sums values, rounding after every accumulation step.
pub fn sum<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    values.into_iter().fold(Decimal::ZERO, add)
}

/// Returns the smaller of two values.
#[must_use]
pub fn min(a: Decimal, b: Decimal) -> Decimal {
    if a <= b { a } else { b }
}

/// Formats a value with exactly two decimals (e.g. `"50.00"`).
#[must_use]
pub fn format(value: Decimal) -> String {
    let mut rounded = round2(value);
    rounded.rescale(SCALE);
    rounded.to_string()
}

/// Parses a decimal string and rounds it to two places.
pub fn parse(input: &str) -> Result<Decimal, FixedParseError> {
    let trimmed = input.trim();
    Decimal::from_str(trimmed)
        .map(round2)
        .map_err(|_| FixedParseError::Unparsable(input.to_string()))
}

/// Parses a strictly positive decimal string.
///
/// Values that round to zero (e.g. `"0.004"`) are rejected.
pub fn parse_positive(input: &str) -> Result<Decimal, FixedParseError> {
    let value = parse(input)?;
    if value <= Decimal::ZERO {
        return Err(FixedParseError::NotPositive(value));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(1.005), dec!(1.01))]
    #[case(dec!(1.004), dec!(1.00))]
    #[case(dec!(-1.005), dec!(-1.01))]
    #[case(dec!(2.675), dec!(2.68))]
    #[case(dec!(0.125), dec!(0.13))]
    #[case(dec!(10), dec!(10))]
    fn test_round2_half_away_from_zero(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(round2(input), expected);
    }

    #[test]
    fn test_chained_payments_do_not_drift() {
        let mut pending = dec!(100.00);
        for _ in 0..3 {
            pending = sub(pending, dec!(33.33));
        }
        assert_eq!(pending, dec!(0.01));
    }

    #[test]
    fn test_sum_rounds_each_step() {
        let values = vec![dec!(0.005), dec!(0.005), dec!(0.005)];
        // 0.01 + 0.01 + 0.01 after per-step rounding
        assert_eq!(sum(values), dec!(0.03));
    }

    #[test]
    fn test_mul_quantity_by_price() {
        assert_eq!(mul(dec!(12.5), dec!(3.333)), dec!(41.66));
        assert_eq!(mul(dec!(50.00), dec!(2100.00)), dec!(105000.00));
    }

    #[test]
    fn test_min() {
        assert_eq!(min(dec!(5), dec!(7)), dec!(5));
        assert_eq!(min(dec!(7), dec!(5)), dec!(5));
    }

    #[test]
    fn test_format_pads_two_decimals() {
        assert_eq!(format(dec!(50)), "50.00");
        assert_eq!(format(dec!(0.1)), "0.10");
        assert_eq!(format(dec!(1.005)), "1.01");
    }

    #[test]
    fn test_parse() {
        assert_eq!(parse(" 12.345 "), Ok(dec!(12.35)));
        assert_eq!(parse("-3"), Ok(dec!(-3)));
        assert_eq!(
            parse("abc"),
            Err(FixedParseError::Unparsable("abc".to_string()))
        );
        assert!(parse("").is_err());
    }

    #[test]
    fn test_parse_positive() {
        assert_eq!(parse_positive("0.01"), Ok(dec!(0.01)));
        assert_eq!(
            parse_positive("0"),
            Err(FixedParseError::NotPositive(dec!(0)))
        );
        assert!(matches!(
            parse_positive("0.004"),
            Err(FixedParseError::NotPositive(_))
        ));
        assert!(parse_positive("-1").is_err());
    }
}
