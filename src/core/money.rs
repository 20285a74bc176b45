//! Money helpers. Amounts are stored as integer cents and converted to
//! [`Decimal`] dollars for arithmetic that must not lose precision.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::str::FromStr;

/// Parses a user supplied dollar amount such as `"1956.40"`.
///
/// Surrounding whitespace is ignored. Returns `None` for anything that is not a
/// plain decimal number.
#[must_use]
pub fn parse_dollars(input: &str) -> Option<Decimal> {
    Decimal::from_str(input.trim()).ok()
}

/// Converts dollars to cents, rounding to two decimal places.
#[must_use]
pub fn dollars_to_cents(dollars: Decimal) -> Option<i64> {
    (dollars.round_dp(2) * Decimal::ONE_HUNDRED).to_i64()
}

/// Parses a dollar string straight to cents.
///
/// ```
/// use clink_finance::core::money::parse_dollars_to_cents;
/// assert_eq!(parse_dollars_to_cents("19.99"), Some(1999));
/// assert_eq!(parse_dollars_to_cents("abc"), None);
/// ```
#[must_use]
pub fn parse_dollars_to_cents(input: &str) -> Option<i64> {
    parse_dollars(input).and_then(dollars_to_cents)
}

/// Exact dollar value of a cent amount.
#[must_use]
pub fn cents_to_decimal(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Dollar value of a cent amount as `f64`, for JSON payloads.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn cents_to_dollars(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Formats cents as a plain two decimal string, e.g. `-12.05`.
#[must_use]
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// Formats cents with a dollar sign, e.g. `$12.05` or `-$12.05`.
#[must_use]
pub fn format_dollars(cents: i64) -> String {
    if cents < 0 {
        format!("-${}", format_cents(-cents))
    } else {
        format!("${}", format_cents(cents))
    }
}

/// Formats a signed net amount with an explicit sign, e.g. `+$5.00`.
#[must_use]
pub fn format_signed_dollars(cents: i64) -> String {
    if cents >= 0 {
        format!("+{}", format_dollars(cents))
    } else {
        format_dollars(cents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_dollars_to_cents() {
        assert_eq!(parse_dollars_to_cents("1956.40"), Some(195_640));
        assert_eq!(parse_dollars_to_cents(" 10 "), Some(1000));
        assert_eq!(parse_dollars_to_cents("0.005"), Some(0));
        assert_eq!(parse_dollars_to_cents("-100.00"), Some(-10_000));
        assert_eq!(parse_dollars_to_cents("invalid"), None);
        assert_eq!(parse_dollars_to_cents(""), None);
    }

    #[test]
    fn test_cents_to_decimal_is_exact() {
        assert_eq!(cents_to_decimal(70_000), dec!(700.00));
        assert_eq!(cents_to_decimal(1), dec!(0.01));
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(-1205), "-12.05");
        assert_eq!(format_dollars(123_456), "$1234.56");
        assert_eq!(format_dollars(-500), "-$5.00");
        assert_eq!(format_signed_dollars(500), "+$5.00");
        assert_eq!(format_signed_dollars(-500), "-$5.00");
    }
}
