//! Threshold mapping and alternative selection (§4.6 decision table).

use reconx_core::config::{MatchingConfig, ThresholdConfig};
use reconx_core::model::{MatchCandidate, MatchStatus};

pub struct Decision {
    pub status: MatchStatus,
    pub best: Option<MatchCandidate>,
    pub alternatives: Vec<MatchCandidate>,
    pub confidence: f64,
}

/// `ranked` must already be sorted descending by `total` with `rank` set
/// (see [`crate::ranker::rank`] / [`crate::ranker::apply_tie_breaking`]).
pub fn decide(ranked: Vec<MatchCandidate>, config: &MatchingConfig) -> Decision {
    let Some(best) = ranked.first().cloned() else {
        return Decision {
            status: MatchStatus::NoCandidates,
            best: None,
            alternatives: Vec::new(),
            confidence: 0.0,
        };
    };

    let status = classify(best.total, &config.thresholds);
    // `best` is always inside its own tie group, so it can carry the
    // ranker's additive tie-break bonus above 1.0 on a near-perfect
    // score; clamp before persisting (§8: `0 <= confidence <= 1`).
    let confidence = best.total.min(1.0);
    let max_alternatives = config.max_alternatives;

    let alternatives = match status {
        MatchStatus::AutoMatched | MatchStatus::NeedsReview => {
            if config.store_alternatives {
                ranked.iter().skip(1).take(max_alternatives).cloned().collect()
            } else {
                Vec::new()
            }
        }
        MatchStatus::Rejected => ranked.into_iter().take(max_alternatives).collect(),
        MatchStatus::NoCandidates | MatchStatus::Pending => Vec::new(),
    };

    Decision {
        status,
        best: Some(best),
        alternatives,
        confidence,
    }
}

fn classify(total: f64, thresholds: &ThresholdConfig) -> MatchStatus {
    if total >= thresholds.auto_match {
        MatchStatus::AutoMatched
    } else if total >= thresholds.needs_review {
        MatchStatus::NeedsReview
    } else {
        MatchStatus::Rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reconx_core::types::{ExternalTxId, SourceLabel, TransactionId};
    use rust_decimal_macros::dec;

    fn candidate(total: f64) -> MatchCandidate {
        MatchCandidate {
            transaction: reconx_core::model::CanonicalTransaction {
                id: TransactionId::new(),
                source: SourceLabel::new("mock"),
                external_id: ExternalTxId::new("x"),
                amount: dec!(1.00),
                currency: "NGN".into(),
                instant: Utc::now(),
                description: None,
                reference: None,
                account_ref: None,
                counterparty_name: None,
                counterparty_email: None,
                status: "success".into(),
                enrichment: None,
                verified: false,
                verified_at: None,
            },
            scores: vec![],
            total,
            rank: 1,
        }
    }

    #[test]
    fn no_candidates_yields_no_candidates_status() {
        let decision = decide(vec![], &MatchingConfig::default());
        assert_eq!(decision.status, MatchStatus::NoCandidates);
        assert!(decision.best.is_none());
    }

    #[test]
    fn high_score_auto_matches_and_stores_alternatives() {
        let ranked = vec![candidate(0.95), candidate(0.70), candidate(0.65)];
        let decision = decide(ranked, &MatchingConfig::default());
        assert_eq!(decision.status, MatchStatus::AutoMatched);
        assert_eq!(decision.alternatives.len(), 2);
    }

    #[test]
    fn mid_score_needs_review() {
        let decision = decide(vec![candidate(0.65)], &MatchingConfig::default());
        assert_eq!(decision.status, MatchStatus::NeedsReview);
    }

    #[test]
    fn low_score_rejected_but_best_retained() {
        let decision = decide(vec![candidate(0.10)], &MatchingConfig::default());
        assert_eq!(decision.status, MatchStatus::Rejected);
        assert!(decision.best.is_some());
    }

    #[test]
    fn confidence_is_clamped_to_one_even_with_a_tie_break_bonus() {
        // Mirrors what `ranker::apply_tie_breaking` can hand back for a
        // near-perfect match: a raw total already pushed above 1.0 by
        // the additive tie-break bonus.
        let decision = decide(vec![candidate(1.0099)], &MatchingConfig::default());
        assert_eq!(decision.status, MatchStatus::AutoMatched);
        assert_eq!(decision.confidence, 1.0);
    }
}
