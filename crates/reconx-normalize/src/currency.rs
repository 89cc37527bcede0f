//! `normalizeCurrency` — map a free-text currency token to ISO-4217.

/// Symbol/name lookup table. Default is `"NGN"` when a non-null but
/// unknown token is supplied; an explicit `None` passes through as `None`.
pub fn normalize_currency(input: Option<&str>) -> Option<String> {
    let raw = input?.trim();
    if raw.is_empty() {
        return Some("NGN".to_string());
    }

    let lower = raw.to_lowercase();
    let code = match lower.as_str() {
        "₦" | "n" | "ngn" | "naira" => "NGN",
        "$" | "usd" | "dollar" | "dollars" => "USD",
        "£" | "gbp" | "pound" | "pounds" => "GBP",
        "€" | "eur" | "euro" | "euros" => "EUR",
        other if other.len() == 3 && other.chars().all(|c| c.is_ascii_alphabetic()) => {
            return Some(other.to_uppercase());
        }
        _ => "NGN",
    };

    Some(code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_symbols_and_names() {
        assert_eq!(normalize_currency(Some("₦")), Some("NGN".into()));
        assert_eq!(normalize_currency(Some("dollar")), Some("USD".into()));
        assert_eq!(normalize_currency(Some("EUR")), Some("EUR".into()));
    }

    #[test]
    fn is_idempotent_on_iso4217_codes() {
        for code in ["NGN", "USD", "GBP", "EUR", "ZAR"] {
            let once = normalize_currency(Some(code));
            let twice = normalize_currency(once.as_deref());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn unknown_token_defaults_to_ngn() {
        assert_eq!(normalize_currency(Some("bitcoin")), Some("NGN".into()));
    }

    #[test]
    fn explicit_none_passes_through() {
        assert_eq!(normalize_currency(None), None);
    }
}
