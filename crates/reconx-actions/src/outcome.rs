//! Outcome categorization and the default action policy (§4.7).

use reconx_core::config::Config;
use reconx_core::model::{ActionKind, MatchCandidate, MatchOutcome, MatchResult, MatchStatus};

/// Derives the dispatcher's outcome category from a persisted match and
/// the ambiguity threshold. Distinct from the internal [`MatchStatus`]
/// used during scoring.
pub fn categorize(result: &MatchResult, config: &Config) -> MatchOutcome {
    let ambiguous_count = config.ambiguous_candidates_count;
    match result.status {
        MatchStatus::AutoMatched => {
            if result.alternative_count() < ambiguous_count {
                MatchOutcome::Matched
            } else {
                MatchOutcome::Ambiguous
            }
        }
        MatchStatus::NeedsReview => MatchOutcome::Review,
        MatchStatus::NoCandidates => MatchOutcome::Unmatched,
        MatchStatus::Rejected => MatchOutcome::Rejected,
        MatchStatus::Pending => MatchOutcome::Review,
    }
}

/// Default action policy per outcome (§4.7 table), before the
/// escalation additive is applied.
pub fn default_actions(outcome: MatchOutcome) -> Vec<ActionKind> {
    match outcome {
        MatchOutcome::Matched => vec![
            ActionKind::MarkVerified,
            ActionKind::UpdateStatus,
            ActionKind::NotifyExternalSystem,
        ],
        MatchOutcome::Ambiguous => vec![ActionKind::CreateTicket, ActionKind::SendEmail, ActionKind::Escalate],
        MatchOutcome::Unmatched => vec![ActionKind::FlagUnmatched, ActionKind::CreateTicket, ActionKind::SendEmail],
        MatchOutcome::Review => vec![ActionKind::CreateTicket, ActionKind::SendEmail],
        MatchOutcome::Rejected => Vec::new(),
    }
}

/// Builds the final ordered action list: the default policy for the
/// outcome, plus `escalate` appended when any escalation condition
/// holds and it isn't already present.
pub fn compute_action_list(result: &MatchResult, outcome: MatchOutcome, config: &Config) -> Vec<ActionKind> {
    let mut actions = default_actions(outcome);

    if should_escalate(result, config) && !actions.contains(&ActionKind::Escalate) {
        actions.push(ActionKind::Escalate);
    }

    actions
}

fn should_escalate(result: &MatchResult, config: &Config) -> bool {
    if let (Some(threshold), Some(best)) = (config.escalate_if_amount_above, result.best_candidate.as_ref()) {
        if amount_above(best, threshold) {
            return true;
        }
    }

    if config.escalate_if_multiple_matches && result.alternative_count() >= config.ambiguous_candidates_count {
        return true;
    }

    if config.escalate_if_no_reference && reference_missing(result.best_candidate.as_ref()) {
        return true;
    }

    false
}

fn amount_above(candidate: &MatchCandidate, threshold: f64) -> bool {
    let Ok(threshold_decimal) = rust_decimal::Decimal::try_from(threshold) else {
        return false;
    };
    candidate.transaction.amount > threshold_decimal
}

fn reference_missing(candidate: Option<&MatchCandidate>) -> bool {
    match candidate.and_then(|c| c.transaction.reference.as_ref()) {
        None => true,
        Some(bundle) => bundle.original.trim().is_empty() || bundle.original.trim().eq_ignore_ascii_case("N/A"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reconx_core::types::{EmailId, MatchId};

    fn result(status: MatchStatus, alternatives: usize) -> MatchResult {
        MatchResult {
            id: MatchId::new(),
            email_id: EmailId::new(),
            best_candidate: None,
            alternative_candidates: (0..alternatives)
                .map(|_| dummy_candidate())
                .collect(),
            status,
            confidence: 0.9,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            notes: None,
        }
    }

    fn dummy_candidate() -> MatchCandidate {
        use reconx_core::types::{ExternalTxId, SourceLabel, TransactionId};
        MatchCandidate {
            transaction: reconx_core::model::CanonicalTransaction {
                id: TransactionId::new(),
                source: SourceLabel::new("mock"),
                external_id: ExternalTxId::new("x"),
                amount: rust_decimal::Decimal::ZERO,
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
            total: 0.5,
            rank: 2,
        }
    }

    #[test]
    fn matched_below_ambiguous_threshold_stays_matched() {
        let r = result(MatchStatus::AutoMatched, 1);
        assert_eq!(categorize(&r, &Config::default()), MatchOutcome::Matched);
    }

    #[test]
    fn matched_with_many_alternatives_becomes_ambiguous() {
        let r = result(MatchStatus::AutoMatched, 2);
        assert_eq!(categorize(&r, &Config::default()), MatchOutcome::Ambiguous);
    }

    #[test]
    fn rejected_has_no_default_actions() {
        assert!(default_actions(MatchOutcome::Rejected).is_empty());
    }

    #[test]
    fn escalates_on_amount_above_threshold() {
        let mut r = result(MatchStatus::AutoMatched, 0);
        let mut candidate = dummy_candidate();
        candidate.transaction.amount = rust_decimal::Decimal::from(10_000_000);
        r.best_candidate = Some(candidate);
        let actions = compute_action_list(&r, MatchOutcome::Matched, &Config::default());
        assert!(actions.contains(&ActionKind::Escalate));
    }
}
