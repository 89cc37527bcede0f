//! Stable ranking plus the tie-breaking adjustment (§4.6).

use reconx_core::config::TieBreakingConfig;
use reconx_core::model::{CanonicalEmail, MatchCandidate};

use crate::rules;

/// Stable sort by `total` descending, `rank` set to 1-based position.
pub fn rank(mut candidates: Vec<MatchCandidate>) -> Vec<MatchCandidate> {
    candidates.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(std::cmp::Ordering::Equal));
    for (i, c) in candidates.iter_mut().enumerate() {
        c.rank = i + 1;
    }
    candidates
}

/// Applies the additive tie-break adjustment to every candidate within
/// `maxTieDifference` of the best, then re-ranks. Candidates outside the
/// tie group are untouched and keep their relative order.
pub fn apply_tie_breaking(
    candidates: Vec<MatchCandidate>,
    config: &TieBreakingConfig,
    email: &CanonicalEmail,
) -> Vec<MatchCandidate> {
    let Some(best_total) = candidates.first().map(|c| c.total) else {
        return candidates;
    };

    let mut adjusted: Vec<MatchCandidate> = candidates
        .into_iter()
        .map(|mut c| {
            if best_total - c.total > config.max_tie_difference {
                return c;
            }
            let tie_score = tie_score(&c, config, email);
            c.total += tie_score * 0.01;
            c
        })
        .collect();

    adjusted.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(std::cmp::Ordering::Equal));
    for (i, c) in adjusted.iter_mut().enumerate() {
        c.rank = i + 1;
    }
    adjusted
}

fn tie_score(candidate: &MatchCandidate, config: &TieBreakingConfig, email: &CanonicalEmail) -> f64 {
    let mut score = 0.0;

    if config.prefer_recent {
        if let Some(email_instant) = email.transaction_instant {
            let delta_hours = (candidate.transaction.instant - email_instant).num_seconds().abs() as f64 / 3600.0;
            score += (1.0 / (1.0 + delta_hours)) * 0.4;
        }
    }

    if config.prefer_high_reference_similarity {
        score += rules::best_reference_raw(&candidate.scores) * 0.4;
    }

    if config.prefer_same_bank {
        score += rules::bank_raw(&candidate.scores) * 0.2;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reconx_core::types::{EmailId, ExternalTxId, MessageId, SourceLabel, TransactionId};
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn candidate(total: f64, bank_raw: f64) -> MatchCandidate {
        use reconx_core::model::RuleScore;
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
            scores: vec![RuleScore::new("bank_match", bank_raw, 0.05, BTreeMap::new())],
            total,
            rank: 0,
        }
    }

    fn email() -> CanonicalEmail {
        CanonicalEmail {
            id: EmailId::new(),
            message_id: MessageId::new("m1"),
            sender: "a".into(),
            subject: "s".into(),
            body: "b".into(),
            received_at: Utc::now(),
            amount: None,
            currency: None,
            transaction_instant: Some(Utc::now()),
            reference: None,
            account_last_segment: None,
            transaction_type: None,
            extraction_confidence: None,
            extraction_method: None,
            is_alert: true,
            enrichment: None,
            composite_key: None,
            processed: false,
            parsing_error: None,
            ingested_at: Utc::now(),
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn rank_assigns_positions_by_descending_total() {
        let ranked = rank(vec![candidate(0.5, 0.0), candidate(0.9, 0.0), candidate(0.7, 0.0)]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[0].total, 0.9);
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn tie_break_favors_higher_bank_raw_within_tie_group() {
        let ranked = rank(vec![candidate(0.80, 0.0), candidate(0.799, 1.0)]);
        let config = TieBreakingConfig {
            prefer_recent: false,
            prefer_high_reference_similarity: false,
            prefer_same_bank: true,
            max_tie_difference: 0.05,
        };
        let broken = apply_tie_breaking(ranked, &config, &email());
        // the second candidate's bank-match bonus (0.2 * 0.01) is just
        // enough to overtake the first, which gets no bonus of its own.
        assert!((broken[0].total - (0.799 + 1.0 * 0.2 * 0.01)).abs() < 1e-9);
        assert_eq!(broken[0].rank, 1);
    }

    #[test]
    fn tie_break_adjustment_never_escapes_the_tie_group() {
        let ranked = rank(vec![candidate(0.80, 0.0), candidate(0.50, 1.0)]);
        let config = TieBreakingConfig {
            prefer_recent: false,
            prefer_high_reference_similarity: false,
            prefer_same_bank: true,
            max_tie_difference: 0.05,
        };
        let broken = apply_tie_breaking(ranked, &config, &email());
        // 0.50 is outside the tie group of 0.80, so it is untouched and stays second.
        assert_eq!(broken[1].total, 0.50);
    }
}
