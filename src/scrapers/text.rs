//! Locale-tolerant conversion of listing text into numbers.

/// Parse a price-like text by keeping only its digits.
///
/// "€ 250.000", "250 000 €" and "250,000" all give `250000`. Returns `None`
/// when no digit is left or the digits overflow an `i64`.
pub fn to_integer_amount(text: &str) -> Option<i64> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Parse a measurement such as "87,5 m²" into `87.5`.
///
/// Unit and currency glyphs are dropped and a decimal comma becomes a point.
pub fn to_decimal_measurement(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Collapse runs of whitespace (including non-breaking spaces) into single spaces.
pub fn squash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_amount_strips_separators_and_glyphs() {
        assert_eq!(to_integer_amount("€ 250.000"), Some(250_000));
        assert_eq!(to_integer_amount("250\u{a0}000 €"), Some(250_000));
        assert_eq!(to_integer_amount("1,295,000"), Some(1_295_000));
        assert_eq!(to_integer_amount("3 bdr."), Some(3));
    }

    #[test]
    fn integer_amount_absent_without_digits() {
        assert_eq!(to_integer_amount(""), None);
        assert_eq!(to_integer_amount("Price on request"), None);
        assert_eq!(to_integer_amount("€"), None);
    }

    #[test]
    fn decimal_measurement_accepts_decimal_comma() {
        assert_eq!(to_decimal_measurement("87,5 m²"), Some(87.5));
        assert_eq!(to_decimal_measurement("120 m²"), Some(120.0));
        assert_eq!(to_decimal_measurement("64.25"), Some(64.25));
    }

    #[test]
    fn decimal_measurement_absent_on_garbage() {
        assert_eq!(to_decimal_measurement("m²"), None);
        assert_eq!(to_decimal_measurement("1.250,5"), None);
    }

    #[test]
    fn squash_whitespace_handles_nbsp() {
        assert_eq!(squash_whitespace("  5100\u{a0}\n JAMBES "), "5100 JAMBES");
    }
}
