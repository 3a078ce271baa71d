//! # Locale Module
//!
//! German number formatting for the price fields: `1.234,56`.
//!
//! ## Round Trip
//! ```text
//! Decimal 1234.5 ──format_number──► "1.234,50" ──parse_number──► 1234.50
//! ```
//! `parse_number(&format_number(x)) == round(x, 2)` for every non-negative
//! amount a supplier can reasonably type.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::pricing::{round_currency, CURRENCY_DECIMALS};

const DECIMAL_SEPARATOR: char = ',';
const THOUSANDS_SEPARATOR: char = '.';

/// Outcome of reading a typed number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ParsedNumber {
    /// Nothing (or only whitespace) was typed.
    Empty,
    /// Text was typed but is not a number.
    Invalid,
    /// A number.
    Value(Decimal),
}

impl ParsedNumber {
    /// Returns the value, or `None` for `Empty` and `Invalid`.
    pub fn value(&self) -> Option<Decimal> {
        match self {
            ParsedNumber::Value(v) => Some(*v),
            ParsedNumber::Empty | ParsedNumber::Invalid => None,
        }
    }
}

/// Formats a value with two decimals, decimal comma and thousands dots.
///
/// ## Example
/// ```rust
/// use offer_core::locale::format_number;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_number(Decimal::new(123456789, 3)), "123.456,79");
/// assert_eq!(format_number(Decimal::ZERO), "0,00");
/// ```
pub fn format_number(value: Decimal) -> String {
    let mut rounded = round_currency(value);
    rounded.rescale(CURRENCY_DECIMALS);

    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let digits = rounded.abs().to_string();
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if negative {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(THOUSANDS_SEPARATOR);
        }
        out.push(ch);
    }
    out.push(DECIMAL_SEPARATOR);
    out.push_str(frac_part);
    out
}

/// Parses German formatted text into the tri-state [`ParsedNumber`].
///
/// Thousands dots are dropped and the decimal comma becomes a point
/// before parsing. Anything left that is not a plain decimal number is
/// `Invalid`.
pub fn parse_number_input(text: &str) -> ParsedNumber {
    let text = text.trim();
    if text.is_empty() {
        return ParsedNumber::Empty;
    }

    let normalized: String = text
        .chars()
        .filter(|c| *c != THOUSANDS_SEPARATOR)
        .collect::<String>()
        .replacen(DECIMAL_SEPARATOR, ".", 1);

    let is_plain = normalized.chars().enumerate().all(|(i, c)| {
        c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+'))
    });
    if !is_plain || !normalized.chars().any(|c| c.is_ascii_digit()) {
        return ParsedNumber::Invalid;
    }

    match Decimal::from_str(&normalized) {
        Ok(value) => ParsedNumber::Value(value),
        Err(_) => ParsedNumber::Invalid,
    }
}

/// Parses German formatted text, returning zero for empty or invalid text.
///
/// Use [`parse_number_input`] when "nothing typed" and "garbage typed"
/// must be told apart from a typed zero.
///
/// ## Example
/// ```rust
/// use offer_core::locale::parse_number;
/// use rust_decimal::Decimal;
///
/// assert_eq!(parse_number("1.234,56"), Decimal::new(123456, 2));
/// assert_eq!(parse_number(""), Decimal::ZERO);
/// assert_eq!(parse_number("abc"), Decimal::ZERO);
/// ```
pub fn parse_number(text: &str) -> Decimal {
    parse_number_input(text).value().unwrap_or(Decimal::ZERO)
}

/// Keeps only the characters a price field accepts while typing.
pub fn sanitize_price_input(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_digit() || *c == THOUSANDS_SEPARATOR || *c == DECIMAL_SEPARATOR)
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn d(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(d("0")), "0,00");
        assert_eq!(format_number(d("0.5")), "0,50");
        assert_eq!(format_number(d("12")), "12,00");
        assert_eq!(format_number(d("999")), "999,00");
        assert_eq!(format_number(d("1000")), "1.000,00");
        assert_eq!(format_number(d("1234.56")), "1.234,56");
        assert_eq!(format_number(d("999999.99")), "999.999,99");
        assert_eq!(format_number(d("1234567.891")), "1.234.567,89");
        assert_eq!(format_number(d("1000000000")), "1.000.000.000,00");
    }

    #[test]
    fn test_format_rounds_half_away_from_zero() {
        assert_eq!(format_number(d("0.005")), "0,01");
        assert_eq!(format_number(d("2.675")), "2,68");
        assert_eq!(format_number(d("0.004")), "0,00");
    }

    #[test]
    fn test_format_negative() {
        assert_eq!(format_number(d("-1234.5")), "-1.234,50");
        assert_eq!(format_number(d("-476")), "-476,00");
        // Rounds to zero, no sign
        assert_eq!(format_number(d("-0.001")), "0,00");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("1.234,56"), d("1234.56"));
        assert_eq!(parse_number("1234,56"), d("1234.56"));
        assert_eq!(parse_number("0,5"), d("0.5"));
        assert_eq!(parse_number("42"), d("42"));
        assert_eq!(parse_number("  7,25 "), d("7.25"));
        assert_eq!(parse_number("1.000.000"), d("1000000"));
        assert_eq!(parse_number("-3,5"), d("-3.5"));
    }

    #[test]
    fn test_parse_number_defaults_to_zero() {
        assert_eq!(parse_number(""), Decimal::ZERO);
        assert_eq!(parse_number("   "), Decimal::ZERO);
        assert_eq!(parse_number("abc"), Decimal::ZERO);
        assert_eq!(parse_number("12abc"), Decimal::ZERO);
        assert_eq!(parse_number("1,2,3"), Decimal::ZERO);
        assert_eq!(parse_number(","), Decimal::ZERO);
    }

    #[test]
    fn test_parse_number_input_tri_state() {
        assert_eq!(parse_number_input(""), ParsedNumber::Empty);
        assert_eq!(parse_number_input(" "), ParsedNumber::Empty);
        assert_eq!(parse_number_input("x"), ParsedNumber::Invalid);
        assert_eq!(parse_number_input("1_000"), ParsedNumber::Invalid);
        assert_eq!(parse_number_input("1e5"), ParsedNumber::Invalid);
        assert_eq!(parse_number_input("0"), ParsedNumber::Value(Decimal::ZERO));
        assert_eq!(parse_number_input("0,00").value(), Some(Decimal::ZERO));
        assert_eq!(parse_number_input("x").value(), None);
    }

    #[test]
    fn test_round_trip() {
        for x in ["0", "0.5", "1234.56", "999999.99", "1000000000", "0.125", "77.777"] {
            let x = d(x);
            assert_eq!(parse_number(&format_number(x)), round_currency(x), "round trip of {x}");
        }
    }

    #[test]
    fn test_sanitize_price_input() {
        assert_eq!(sanitize_price_input("1.234,56 €"), "1.234,56");
        assert_eq!(sanitize_price_input("abc"), "");
        assert_eq!(sanitize_price_input("-12,5"), "12,5");
    }
}
