//! Brazilian price-text parsing.
//!
//! Auction sites print money as `"R$ 350.000,00"` (dot for thousands,
//! comma for decimals), but generated text and older pages also show plain
//! `"350000"` or `"123.45"`. Parsing is best-effort: text with no number in
//! it (e.g. `"preço a consultar"`) yields `None`, never an error.

use rust_decimal::Decimal;

/// Parses Brazilian-formatted price text into a decimal value.
///
/// The first run of digits-and-separators in the text is taken as the
/// number; a trailing separator followed by one or two digits is the
/// decimal part, any other separator is a thousands mark. Returns `None`
/// when the text contains no digits.
#[must_use]
pub fn parse_brl(text: &str) -> Option<Decimal> {
    let token = extract_number_token(text)?;

    let (integer, fraction) = split_decimal(&token);
    let digits: String = integer.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }

    let normalized = match fraction {
        Some(frac) => format!("{digits}.{frac}"),
        None => digits,
    };

    normalized.parse::<Decimal>().ok()
}

/// Rounds `price` to the nearest multiple of `bucket`.
///
/// A zero or negative bucket disables bucketing and returns the price
/// unchanged.
#[must_use]
pub fn bucket_price(price: Decimal, bucket: Decimal) -> Decimal {
    if bucket <= Decimal::ZERO {
        return price;
    }
    ((price / bucket).round() * bucket).normalize()
}

/// Finds the first maximal run of digits and separators that contains at
/// least one digit, trimmed of leading/trailing separators.
fn extract_number_token(text: &str) -> Option<String> {
    let mut token = String::new();
    let mut in_run = false;

    for c in text.chars() {
        if c.is_ascii_digit() || c == '.' || c == ',' {
            token.push(c);
            in_run = in_run || c.is_ascii_digit();
        } else if in_run {
            break;
        } else {
            token.clear();
        }
    }

    if !in_run {
        return None;
    }
    Some(token.trim_matches(|c| c == '.' || c == ',').to_owned())
}

/// Splits a token like `"350.000,00"` into integer and fractional parts.
///
/// The last separator is the decimal mark iff one or two digits follow it;
/// three digits after the last separator is a thousands group
/// (`"350.000"` → 350000).
fn split_decimal(token: &str) -> (&str, Option<&str>) {
    let Some(idx) = token.rfind([',', '.']) else {
        return (token, None);
    };
    let after = &token[idx + 1..];
    if (1..=2).contains(&after.len()) {
        (&token[..idx], Some(after))
    } else {
        (token, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn parses_standard_brl_format() {
        assert_eq!(parse_brl("R$ 350.000,00"), Some(dec("350000.00")));
        assert_eq!(parse_brl("R$ 1.234.567,89"), Some(dec("1234567.89")));
    }

    #[test]
    fn parses_thousands_only() {
        assert_eq!(parse_brl("R$ 350.000"), Some(dec("350000")));
    }

    #[test]
    fn parses_decimal_comma_without_thousands() {
        assert_eq!(parse_brl("123,45"), Some(dec("123.45")));
        assert_eq!(parse_brl("R$ 0,50"), Some(dec("0.50")));
    }

    #[test]
    fn parses_plain_integer_and_decimal_point() {
        assert_eq!(parse_brl("350000"), Some(dec("350000")));
        assert_eq!(parse_brl("123.45"), Some(dec("123.45")));
    }

    #[test]
    fn parses_number_embedded_in_text() {
        assert_eq!(
            parse_brl("Avaliação: R$ 90.000,00 (lance livre)"),
            Some(dec("90000.00"))
        );
    }

    #[test]
    fn non_numeric_text_is_none() {
        assert_eq!(parse_brl("preço a consultar"), None);
        assert_eq!(parse_brl(""), None);
        assert_eq!(parse_brl("R$ --"), None);
    }

    #[test]
    fn takes_first_number_when_text_has_several() {
        assert_eq!(
            parse_brl("R$ 350.000,00 (lance mínimo R$ 175.000,00)"),
            Some(dec("350000.00"))
        );
    }

    #[test]
    fn bucket_rounds_to_nearest_multiple() {
        assert_eq!(bucket_price(dec("350100"), dec("1000")), dec("350000"));
        assert_eq!(bucket_price(dec("350600"), dec("1000")), dec("351000"));
        assert_eq!(bucket_price(dec("350000.00"), dec("1000")), dec("350000"));
    }

    #[test]
    fn zero_bucket_disables_bucketing() {
        assert_eq!(bucket_price(dec("350123.45"), Decimal::ZERO), dec("350123.45"));
    }
}
