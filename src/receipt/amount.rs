use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::extraction::strip_thousands;

static GROUPED_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{1,3}(?:[.,]\d{3})+|\d+)$").expect("amount pattern must compile")
});

/// Parses an amount in the currency's smallest unit. Separators are only
/// accepted between groups of three digits, so `100.00` is not an amount.
pub fn parse_amount(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if !GROUPED_AMOUNT.is_match(trimmed) {
        return None;
    }
    strip_thousands(trimmed).parse().ok()
}

/// `1234567` -> `1,234,567`.
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Formatted amount, or the raw input untouched when it does not parse.
pub fn display_amount(raw: &str) -> String {
    parse_amount(raw)
        .map(format_thousands)
        .unwrap_or_else(|| raw.to_string())
}

/// `floor(amount * rate)`, truncated to whole units.
pub fn commission(amount: i64, rate: Decimal) -> i64 {
    (Decimal::from(amount) * rate)
        .floor()
        .to_i64()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_grouping() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(100000), "100,000");
        assert_eq!(format_thousands(1234567), "1,234,567");
        assert_eq!(format_thousands(-4500), "-4,500");
    }

    #[test]
    fn parses_grouped_and_plain_amounts() {
        assert_eq!(parse_amount("210.000"), Some(210000));
        assert_eq!(parse_amount(" 1,250,000 "), Some(1250000));
        assert_eq!(parse_amount("5000"), Some(5000));
        assert_eq!(parse_amount("12a"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("-5"), None);
    }

    #[test]
    fn misplaced_separators_are_not_amounts() {
        assert_eq!(parse_amount("100.00"), None);
        assert_eq!(parse_amount("1.2.3"), None);
        assert_eq!(parse_amount("1,0000"), None);
        assert_eq!(parse_amount(".500"), None);
        assert_eq!(display_amount("100.00"), "100.00");
    }

    #[test]
    fn malformed_amount_displays_verbatim() {
        assert_eq!(display_amount("cien mil"), "cien mil");
        assert_eq!(display_amount("100000"), "100,000");
    }

    #[test]
    fn commission_truncates() {
        assert_eq!(commission(100000, Decimal::new(6, 2)), 6000);
        assert_eq!(commission(12345, Decimal::new(6, 2)), 740);
        assert_eq!(commission(999, Decimal::new(15, 3)), 14);
        assert_eq!(commission(0, Decimal::new(6, 2)), 0);
    }
}
