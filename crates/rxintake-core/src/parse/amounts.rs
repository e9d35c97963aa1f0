//! Coercion of raw quantity and price text into numbers.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse a price such as `"$1,234.50"`. Thousands separators, currency sign
/// and whitespace are ignored.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '$') && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str(&cleaned).ok()
}

/// Parse a quantity such as `"1,200"` or `"2.7"`, truncating to a whole number.
///
/// Negative or non-numeric text (e.g. a strength like `"500mg"`) yields `None`.
pub fn coerce_quantity(raw: &str) -> Option<u32> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    let value = Decimal::from_str(&cleaned).ok()?;
    value.trunc().to_u32()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("3.50"), Some(Decimal::new(350, 2)));
        assert_eq!(parse_amount("$1,234.56"), Some(Decimal::new(123456, 2)));
        assert_eq!(parse_amount(" 8.50 "), Some(Decimal::new(850, 2)));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("n/a"), None);
    }

    #[test]
    fn test_coerce_quantity() {
        assert_eq!(coerce_quantity("10"), Some(10));
        assert_eq!(coerce_quantity("1,200"), Some(1200));
        assert_eq!(coerce_quantity("2.9"), Some(2));
        assert_eq!(coerce_quantity("500mg"), None);
        assert_eq!(coerce_quantity("-3"), None);
        assert_eq!(coerce_quantity(""), None);
    }
}
