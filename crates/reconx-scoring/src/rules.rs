//! The seven scoring rules (§4.6). Each is a pure function over a
//! `(CanonicalEmail, CanonicalTransaction)` pair returning a raw score in
//! `[0,1]` and a detail map for diagnostics — none of them touch storage
//! or mutate their inputs.

use std::collections::BTreeMap;

use reconx_core::config::{FuzzyMatchConfig, RuleWeights};
use reconx_core::model::{CanonicalEmail, CanonicalTransaction, Enrichment, RuleScore};
use reconx_normalize::FuzzyMatcher;
use rust_decimal::Decimal;
use serde_json::json;

pub const RULE_EXACT_AMOUNT: &str = "exact_amount";
pub const RULE_EXACT_REFERENCE: &str = "exact_reference";
pub const RULE_FUZZY_REFERENCE: &str = "fuzzy_reference";
pub const RULE_TIMESTAMP_PROXIMITY: &str = "timestamp_proximity";
pub const RULE_ACCOUNT_MATCH: &str = "account_match";
pub const RULE_COMPOSITE_KEY: &str = "composite_key";
pub const RULE_BANK_MATCH: &str = "bank_match";

/// Runs every rule for one candidate and returns their contributions in
/// a fixed, stable order.
pub fn score_all(
    email: &CanonicalEmail,
    tx: &CanonicalTransaction,
    weights: &RuleWeights,
    fuzzy_config: &FuzzyMatchConfig,
    window_hours: i64,
    amount_tolerance_percent: f64,
) -> Vec<RuleScore> {
    vec![
        exact_amount(email, tx, weights.exact_amount, amount_tolerance_percent),
        exact_reference(email, tx, weights.exact_reference),
        fuzzy_reference(email, tx, weights.fuzzy_reference, fuzzy_config),
        timestamp_proximity(email, tx, weights.timestamp_proximity, window_hours),
        account_match(email, tx, weights.account_match),
        composite_key_rule(email, tx, weights.composite_key),
        bank_match(email, tx, weights.bank_match),
    ]
}

fn exact_amount(email: &CanonicalEmail, tx: &CanonicalTransaction, weight: f64, tolerance_percent: f64) -> RuleScore {
    let mut details = BTreeMap::new();
    let Some(email_amount) = email.amount else {
        details.insert("reason".into(), json!("email amount missing"));
        return RuleScore::new(RULE_EXACT_AMOUNT, 0.0, weight, details);
    };

    let diff = (tx.amount - email_amount).abs();
    let tolerance = (email_amount * Decimal::try_from(tolerance_percent).unwrap_or_default()).abs();
    details.insert("diff".into(), json!(diff.to_string()));

    let raw = if diff.is_zero() {
        1.0
    } else if diff <= tolerance {
        0.95
    } else {
        0.0
    };
    RuleScore::new(RULE_EXACT_AMOUNT, raw, weight, details)
}

fn exact_reference(email: &CanonicalEmail, tx: &CanonicalTransaction, weight: f64) -> RuleScore {
    let mut details = BTreeMap::new();
    let raw = match (&email.reference, &tx.reference) {
        (Some(e), Some(t)) => {
            if e.alphanumeric_only == t.alphanumeric_only {
                1.0
            } else if e.cleaned == t.cleaned {
                0.95
            } else {
                0.0
            }
        }
        _ => {
            details.insert("reason".into(), json!("reference missing on one or both sides"));
            0.0
        }
    };
    RuleScore::new(RULE_EXACT_REFERENCE, raw, weight, details)
}

fn fuzzy_reference(email: &CanonicalEmail, tx: &CanonicalTransaction, weight: f64, fuzzy_config: &FuzzyMatchConfig) -> RuleScore {
    let matcher = FuzzyMatcher::new(*fuzzy_config);
    let a = email.reference.as_ref().map(|r| r.cleaned.as_str());
    let b = tx.reference.as_ref().map(|r| r.cleaned.as_str());
    let raw = matcher.best_similarity(a, b);

    let mut details = BTreeMap::new();
    details.insert("best_similarity".into(), json!(raw));
    RuleScore::new(RULE_FUZZY_REFERENCE, raw, weight, details)
}

fn timestamp_proximity(email: &CanonicalEmail, tx: &CanonicalTransaction, weight: f64, window_hours: i64) -> RuleScore {
    let mut details = BTreeMap::new();
    let Some(email_instant) = email.transaction_instant else {
        details.insert("reason".into(), json!("email instant missing"));
        return RuleScore::new(RULE_TIMESTAMP_PROXIMITY, 0.5, weight, details);
    };

    let delta_hours = (tx.instant - email_instant).num_seconds().unsigned_abs() as f64 / 3600.0;
    details.insert("delta_hours".into(), json!(delta_hours));

    let raw = if delta_hours <= 1.0 {
        1.0
    } else if delta_hours <= window_hours as f64 {
        1.0 - delta_hours / window_hours as f64
    } else {
        0.0
    };
    RuleScore::new(RULE_TIMESTAMP_PROXIMITY, raw.max(0.0), weight, details)
}

fn account_match(email: &CanonicalEmail, tx: &CanonicalTransaction, weight: f64) -> RuleScore {
    let mut details = BTreeMap::new();
    let raw = match (&email.account_last_segment, &tx.account_ref) {
        (Some(e), Some(t)) => {
            if e == t {
                1.0
            } else if last4(e) == last4(t) {
                1.0
            } else {
                let similarity = strsim::normalized_levenshtein(e, t);
                details.insert("similarity".into(), json!(similarity));
                if similarity >= 0.8 {
                    similarity
                } else {
                    0.0
                }
            }
        }
        _ => {
            details.insert("reason".into(), json!("account reference missing on one or both sides"));
            0.0
        }
    };
    RuleScore::new(RULE_ACCOUNT_MATCH, raw, weight, details)
}

fn last4(s: &str) -> &str {
    let chars: Vec<char> = s.chars().collect();
    let start = chars.len().saturating_sub(4);
    let idx: usize = chars[..start].iter().map(|c| c.len_utf8()).sum();
    &s[idx..]
}

fn composite_key_rule(email: &CanonicalEmail, tx: &CanonicalTransaction, weight: f64) -> RuleScore {
    let mut details = BTreeMap::new();

    let Some(email_key) = &email.composite_key else {
        details.insert("reason".into(), json!("email composite key unavailable"));
        return RuleScore::new(RULE_COMPOSITE_KEY, 0.0, weight, details);
    };
    let tx_key = reconx_normalize::composite_key(
        Some(tx.amount),
        Some(tx.currency.as_str()),
        Some(tx.instant),
        tx.reference.as_ref(),
        tx.account_ref.as_deref(),
    );
    let Some(tx_key) = tx_key else {
        details.insert("reason".into(), json!("transaction composite key unavailable"));
        return RuleScore::new(RULE_COMPOSITE_KEY, 0.0, weight, details);
    };

    if email_key.as_string() == tx_key.as_string() {
        return RuleScore::new(RULE_COMPOSITE_KEY, 1.0, weight, details);
    }

    let currency_match = email_key.currency == tx_key.currency;
    let amount_match = email_key.amount_string == tx_key.amount_string;
    let date_bucket_match = email_key.date_bucket == tx_key.date_bucket;
    let last4_match = email_key.account_last4.is_some() && email_key.account_last4 == tx_key.account_last4;
    let token_overlap = token_overlap_fraction(&email_key.top_reference_tokens, &tx_key.top_reference_tokens);
    let token_match = token_overlap > 0.5;

    let matched = [currency_match, amount_match, date_bucket_match, last4_match, token_match]
        .iter()
        .filter(|m| **m)
        .count();

    details.insert("currency_match".into(), json!(currency_match));
    details.insert("amount_match".into(), json!(amount_match));
    details.insert("date_bucket_match".into(), json!(date_bucket_match));
    details.insert("last4_match".into(), json!(last4_match));
    details.insert("token_overlap".into(), json!(token_overlap));

    RuleScore::new(RULE_COMPOSITE_KEY, matched as f64 / 5.0, weight, details)
}

fn token_overlap_fraction(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let set_a: std::collections::BTreeSet<&String> = a.iter().collect();
    let set_b: std::collections::BTreeSet<&String> = b.iter().collect();
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

fn bank_match(email: &CanonicalEmail, tx: &CanonicalTransaction, weight: f64) -> RuleScore {
    let mut details = BTreeMap::new();
    let raw = match (&email.enrichment, &tx.enrichment) {
        (Some(e), Some(t)) => {
            if e.bank_code == t.bank_code {
                average_confidence(e, t)
            } else {
                0.0
            }
        }
        _ => {
            details.insert("reason".into(), json!("enrichment missing on one or both sides"));
            0.0
        }
    };
    RuleScore::new(RULE_BANK_MATCH, raw, weight, details)
}

fn average_confidence(a: &Enrichment, b: &Enrichment) -> f64 {
    (a.confidence + b.confidence) / 2.0
}

/// Reuses an already-built reference bundle's cleaned form in contexts
/// that only have the two halves on hand (tie-breaking).
pub fn best_reference_raw(scores: &[RuleScore]) -> f64 {
    scores
        .iter()
        .filter(|s| s.rule_name == RULE_EXACT_REFERENCE || s.rule_name == RULE_FUZZY_REFERENCE)
        .map(|s| s.raw)
        .fold(0.0_f64, f64::max)
}

pub fn bank_raw(scores: &[RuleScore]) -> f64 {
    scores
        .iter()
        .find(|s| s.rule_name == RULE_BANK_MATCH)
        .map(|s| s.raw)
        .unwrap_or(0.0)
}
