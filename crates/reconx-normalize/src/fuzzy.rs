//! Fuzzy string similarity used by the `fuzzyReference` rule.
//!
//! Four edit-distance-family scores, each in `[0,1]`, gated by the
//! `min_similarity` floor: a plain ratio, a partial (substring) ratio, a
//! token-sort ratio (order-independent), and a token-set ratio
//! (set-intersection/union aware). `fuzzyReference` takes the max.

use reconx_core::config::FuzzyMatchConfig;

pub struct FuzzyMatcher {
    config: FuzzyMatchConfig,
}

impl FuzzyMatcher {
    pub fn new(config: FuzzyMatchConfig) -> Self {
        Self { config }
    }

    /// Levenshtein ratio between the two whole strings.
    pub fn simple_ratio(&self, a: Option<&str>, b: Option<&str>) -> f64 {
        let (a, b) = match (a, b) {
            (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => (a, b),
            _ => return 0.0,
        };

        let score = strsim::normalized_levenshtein(a, b);
        gate(score, self.config.min_similarity)
    }

    /// Best alignment of the shorter string within the longer one.
    pub fn partial_ratio(&self, a: Option<&str>, b: Option<&str>) -> f64 {
        let (a, b) = match (a, b) {
            (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => (a, b),
            _ => return 0.0,
        };

        if !self.config.use_partial_ratio {
            return self.simple_ratio(Some(a), Some(b));
        }

        let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };
        let short_chars: Vec<char> = shorter.chars().collect();
        let long_chars: Vec<char> = longer.chars().collect();

        if short_chars.is_empty() {
            return 0.0;
        }

        let mut best = 0.0_f64;
        if long_chars.len() <= short_chars.len() {
            best = strsim::normalized_levenshtein(shorter, longer);
        } else {
            for start in 0..=(long_chars.len() - short_chars.len()) {
                let window: String = long_chars[start..start + short_chars.len()].iter().collect();
                let score = strsim::normalized_levenshtein(shorter, &window);
                if score > best {
                    best = score;
                }
            }
        }

        gate(best, self.config.min_similarity)
    }

    /// Sorts whitespace-separated tokens before comparing, so word order
    /// doesn't matter (`"GTB Transfer 2025"` matches `"Transfer 2025 GTB"`).
    pub fn token_sort_ratio(&self, a: Option<&str>, b: Option<&str>) -> f64 {
        let (a, b) = match (a, b) {
            (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => (a, b),
            _ => return 0.0,
        };

        if !self.config.use_token_sort {
            return self.simple_ratio(Some(a), Some(b));
        }

        let sorted_a = sorted_tokens(a, self.config.min_token_length);
        let sorted_b = sorted_tokens(b, self.config.min_token_length);

        let score = strsim::normalized_levenshtein(&sorted_a, &sorted_b);
        gate(score, self.config.min_similarity)
    }

    /// Set-intersection/union aware comparison: compares the shared
    /// token set against each side's remainder and takes the best score.
    pub fn token_set_ratio(&self, a: Option<&str>, b: Option<&str>) -> f64 {
        let (a, b) = match (a, b) {
            (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => (a, b),
            _ => return 0.0,
        };

        let tokens_a: std::collections::BTreeSet<String> = tokenize(a, self.config.min_token_length);
        let tokens_b: std::collections::BTreeSet<String> = tokenize(b, self.config.min_token_length);

        let intersection: Vec<&String> = tokens_a.intersection(&tokens_b).collect();
        let only_a: Vec<&String> = tokens_a.difference(&tokens_b).collect();
        let only_b: Vec<&String> = tokens_b.difference(&tokens_a).collect();

        let inter_str = join_sorted(&intersection);
        let combined_a = join_sorted(&intersection.iter().chain(only_a.iter()).cloned().collect::<Vec<_>>());
        let combined_b = join_sorted(&intersection.iter().chain(only_b.iter()).cloned().collect::<Vec<_>>());

        let candidates = [
            strsim::normalized_levenshtein(&inter_str, &combined_a),
            strsim::normalized_levenshtein(&inter_str, &combined_b),
            strsim::normalized_levenshtein(&combined_a, &combined_b),
        ];

        let best = candidates.iter().cloned().fold(0.0_f64, f64::max);
        gate(best, self.config.min_similarity)
    }

    /// Best of all four variants, each already gated by `min_similarity`.
    pub fn best_similarity(&self, a: Option<&str>, b: Option<&str>) -> f64 {
        [
            self.simple_ratio(a, b),
            self.partial_ratio(a, b),
            self.token_sort_ratio(a, b),
            self.token_set_ratio(a, b),
        ]
        .iter()
        .cloned()
        .fold(0.0_f64, f64::max)
    }
}

fn gate(score: f64, min_similarity: f64) -> f64 {
    if score >= min_similarity {
        score
    } else {
        0.0
    }
}

fn tokenize(s: &str, min_token_length: usize) -> std::collections::BTreeSet<String> {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| t.len() >= min_token_length)
        .map(|t| t.to_ascii_uppercase())
        .collect()
}

fn sorted_tokens(s: &str, min_token_length: usize) -> String {
    let mut tokens: Vec<String> = tokenize(s, min_token_length).into_iter().collect();
    tokens.sort();
    tokens.join(" ")
}

fn join_sorted(tokens: &[&String]) -> String {
    let mut v: Vec<&str> = tokens.iter().map(|s| s.as_str()).collect();
    v.sort();
    v.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> FuzzyMatcher {
        FuzzyMatcher::new(FuzzyMatchConfig::default())
    }

    #[test]
    fn exact_strings_score_one() {
        assert_eq!(matcher().simple_ratio(Some("GTB123"), Some("GTB123")), 1.0);
    }

    #[test]
    fn token_sort_ignores_word_order() {
        let m = matcher();
        let score = m.token_sort_ratio(Some("GTB Transfer 2025"), Some("Transfer 2025 GTB"));
        assert_eq!(score, 1.0);
    }

    #[test]
    fn below_min_similarity_returns_zero() {
        let m = matcher();
        assert_eq!(m.simple_ratio(Some("abcdef"), Some("zzzzzz")), 0.0);
    }

    #[test]
    fn partial_ratio_finds_substring_match() {
        let m = matcher();
        let score = m.partial_ratio(Some("TRF2025001"), Some("REF TRF2025001 CONFIRMED"));
        assert!(score >= 0.99, "expected near-perfect partial match, got {score}");
    }

    #[test]
    fn missing_inputs_score_zero() {
        let m = matcher();
        assert_eq!(m.simple_ratio(None, Some("x")), 0.0);
        assert_eq!(m.simple_ratio(Some(""), Some("x")), 0.0);
    }
}
