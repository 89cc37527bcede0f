//! `normalizeReference` — build a `ReferenceBundle` from free text.

use reconx_core::model::ReferenceBundle;

/// Collapses internal whitespace; computes the uppercase alphanumeric-only
/// form; tokenizes on non-alphanumeric boundaries and drops tokens
/// shorter than `min_token_length`.
pub fn normalize_reference(input: Option<&str>, min_token_length: usize) -> Option<ReferenceBundle> {
    let raw = input?.trim();
    if raw.is_empty() {
        return None;
    }

    let cleaned = collapse_whitespace(raw);
    let alphanumeric_only: String = cleaned
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let tokens = tokenize(&cleaned, min_token_length);

    Some(ReferenceBundle {
        original: raw.to_string(),
        cleaned,
        alphanumeric_only,
        tokens,
    })
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn tokenize(s: &str, min_token_length: usize) -> Vec<String> {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| t.len() >= min_token_length)
        .map(|t| t.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_and_builds_alphanumeric_form() {
        let bundle = normalize_reference(Some("GTB/TRF/2025/001  extra"), 3).unwrap();
        assert_eq!(bundle.cleaned, "GTB/TRF/2025/001 extra");
        assert_eq!(bundle.alphanumeric_only, "GTBTRF2025001EXTRA");
    }

    #[test]
    fn tokenizes_on_non_alphanumeric_boundaries_and_filters_short_tokens() {
        let bundle = normalize_reference(Some("GTB-TRF-25-001-ab"), 3).unwrap();
        assert_eq!(bundle.tokens, vec!["GTB", "TRF", "001"]);
    }

    #[test]
    fn returns_none_for_empty_input() {
        assert!(normalize_reference(Some(""), 3).is_none());
        assert!(normalize_reference(None, 3).is_none());
    }
}
