//! `normalizeAmount` — parse a free-text amount into a scale-2 decimal.

use rust_decimal::Decimal;

const CURRENCY_MARKERS: &[&str] = &[
    "₦", "N", "$", "£", "€", "NGN", "USD", "GBP", "EUR", "naira", "dollar", "pound", "euro",
];

/// Accepts strings containing any of the recognized currency markers or
/// raw numbers; strips grouping commas and parses the first numeric
/// token. Returns `None` for unparsable input.
pub fn normalize_amount(input: Option<&str>) -> Option<Decimal> {
    let raw = input?.trim();
    if raw.is_empty() {
        return None;
    }

    let mut stripped = raw.to_string();
    for marker in CURRENCY_MARKERS {
        stripped = stripped.replace(marker, " ");
    }

    let token = first_numeric_token(&stripped)?;
    let cleaned: String = token.chars().filter(|c| *c != ',').collect();

    cleaned.parse::<Decimal>().ok().map(|d| d.round_dp(2))
}

fn first_numeric_token(s: &str) -> Option<String> {
    let mut token = String::new();
    let mut seen_digit = false;
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_ascii_digit() || c == ',' || (c == '.' && seen_digit) {
            if c.is_ascii_digit() {
                seen_digit = true;
            }
            token.push(c);
        } else if c == '-' && token.is_empty() {
            // leading minus sign for negative amounts
            token.push(c);
        } else if seen_digit {
            break;
        } else {
            let _ = chars.peek();
        }
    }

    if seen_digit {
        Some(token)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_naira_symbol_with_grouping_commas() {
        assert_eq!(normalize_amount(Some("₦1,234.56")), Some(dec!(1234.56)));
    }

    #[test]
    fn parses_trailing_currency_code() {
        assert_eq!(normalize_amount(Some("1234.56 NGN")), Some(dec!(1234.56)));
    }

    #[test]
    fn parses_bare_number() {
        assert_eq!(normalize_amount(Some("1234.56")), Some(dec!(1234.56)));
    }

    #[test]
    fn rounds_to_scale_two() {
        assert_eq!(normalize_amount(Some("1234.5")), Some(dec!(1234.50)));
    }

    #[test]
    fn returns_none_for_unparsable_input() {
        assert_eq!(normalize_amount(Some("no numbers here")), None);
        assert_eq!(normalize_amount(None), None);
        assert_eq!(normalize_amount(Some("")), None);
    }
}
