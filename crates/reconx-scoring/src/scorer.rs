//! Turns a raw candidate list into scored, ranked [`MatchCandidate`]s.

use reconx_core::config::MatchingConfig;
use reconx_core::model::{CanonicalEmail, CanonicalTransaction, MatchCandidate};

use crate::rules;

/// Scores every transaction against the email. Does not rank or truncate
/// — see [`crate::ranker::rank`].
pub fn score_candidates(
    email: &CanonicalEmail,
    transactions: &[CanonicalTransaction],
    config: &MatchingConfig,
) -> Vec<MatchCandidate> {
    transactions
        .iter()
        .map(|tx| {
            let scores = rules::score_all(
                email,
                tx,
                &config.rule_weights,
                &config.fuzzy_match,
                config.time_window.default_hours,
                config.candidate_retrieval.amount_tolerance_percent,
            );
            let total: f64 = scores.iter().map(|s| s.weighted).sum();
            MatchCandidate {
                transaction: tx.clone(),
                scores,
                total,
                rank: 0,
            }
        })
        .collect()
}
