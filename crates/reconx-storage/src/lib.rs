//! reconx-storage
//!
//! The storage repository (C4): the [`Repository`] contract consumed by
//! everything downstream, a sled-backed implementation, and an in-memory
//! fake for tests that don't need a real database on disk.

pub mod mem_repo;
pub mod repository;
pub mod sled_repo;

pub use mem_repo::InMemoryRepository;
pub use repository::{CandidateQuery, Repository};
pub use sled_repo::SledRepository;

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use reconx_core::model::{CanonicalEmail, CanonicalTransaction, MatchCandidate, MatchResult, MatchStatus, RuleScore};
    use reconx_core::types::{EmailId, ExternalTxId, MatchId, MessageId, SourceLabel, TransactionId};
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    use super::*;

    fn sample_transaction(external_id: &str, amount: rust_decimal::Decimal) -> CanonicalTransaction {
        CanonicalTransaction {
            id: TransactionId::new(),
            source: SourceLabel::new("mock"),
            external_id: ExternalTxId::new(external_id),
            amount,
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
        }
    }

    fn sample_email(message_id: &str) -> CanonicalEmail {
        CanonicalEmail {
            id: EmailId::new(),
            message_id: MessageId::new(message_id),
            sender: "alerts@bank.example".into(),
            subject: "Credit Alert".into(),
            body: "...".into(),
            received_at: Utc::now(),
            amount: Some(dec!(500.00)),
            currency: Some("NGN".into()),
            transaction_instant: Some(Utc::now()),
            reference: None,
            account_last_segment: None,
            transaction_type: None,
            extraction_confidence: Some(0.9),
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

    fn candidate_query(amount: rust_decimal::Decimal) -> CandidateQuery {
        CandidateQuery {
            amount,
            currency: Some("NGN".into()),
            instant: Some(Utc::now()),
            window_hours: 48,
            amount_tolerance: 0.01,
            require_same_currency: true,
            exclude_matched: true,
        }
    }

    /// Runs the same sequence of operations against any [`Repository`] —
    /// used to exercise both backends from one place.
    fn exercise(repo: &dyn Repository) {
        let tx = sample_transaction("ext-1", dec!(500.00));
        assert!(repo.upsert_transaction(&tx).unwrap());
        assert!(!repo.upsert_transaction(&tx).unwrap());

        let found = repo
            .find_transaction_by_external_id(&tx.source, &tx.external_id)
            .unwrap()
            .unwrap();
        assert_eq!(found.id, tx.id);

        let email = sample_email("msg-1");
        assert!(repo.upsert_email(&email).unwrap());
        assert!(!repo.upsert_email(&email).unwrap());

        let unmatched = repo.list_unmatched_emails(None).unwrap();
        assert_eq!(unmatched.len(), 1);

        let candidates = repo.find_candidate_transactions(&candidate_query(dec!(500.00))).unwrap();
        assert_eq!(candidates.len(), 1);

        let mut details = BTreeMap::new();
        details.insert("matched".to_string(), serde_json::json!(true));
        let candidate = MatchCandidate {
            transaction: tx.clone(),
            scores: vec![RuleScore::new("exact_amount", 1.0, 0.25, details)],
            total: 0.9,
            rank: 0,
        };
        let result = MatchResult {
            id: MatchId::new(),
            email_id: email.id,
            best_candidate: Some(candidate),
            alternative_candidates: vec![],
            status: MatchStatus::AutoMatched,
            confidence: 0.9,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            notes: None,
        };
        repo.write_match(&result).unwrap();

        let stored = repo.get_match_for_email(email.id).unwrap().unwrap();
        assert_eq!(stored.id, result.id);

        // Now excluded from candidate search since it's auto-matched.
        let candidates = repo.find_candidate_transactions(&candidate_query(dec!(500.00))).unwrap();
        assert!(candidates.is_empty());

        repo.mark_email_processed(email.id, None).unwrap();
        let unmatched_after = repo.list_unmatched_emails(None).unwrap();
        assert!(unmatched_after.is_empty());

        let verified_at = Utc::now();
        repo.mark_transaction_verified(tx.id, verified_at).unwrap();
        repo.mark_transaction_verified(tx.id, verified_at).unwrap();
        let verified = repo.get_transaction(tx.id).unwrap().unwrap();
        assert!(verified.verified);

        // Rematch replaces the row outright: once the email's match is
        // rewritten as `no_candidates`, the transaction must become
        // eligible for candidate search again — the superseded
        // `AutoMatched` row must not linger and keep excluding it.
        let rematched = MatchResult {
            id: MatchId::new(),
            email_id: email.id,
            best_candidate: None,
            alternative_candidates: vec![],
            status: MatchStatus::NoCandidates,
            confidence: 0.0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            notes: None,
        };
        repo.write_match(&rematched).unwrap();

        let stored = repo.get_match_for_email(email.id).unwrap().unwrap();
        assert_eq!(stored.id, rematched.id, "rematch must leave exactly one match row for the email");

        let candidates = repo.find_candidate_transactions(&candidate_query(dec!(500.00))).unwrap();
        assert_eq!(candidates.len(), 1, "superseded match must not keep excluding the transaction");
    }

    #[test]
    fn in_memory_repository_round_trips_core_operations() {
        let repo = InMemoryRepository::new();
        exercise(&repo);
    }

    #[test]
    fn sled_repository_round_trips_core_operations() {
        let dir = tempfile::tempdir().unwrap();
        let repo = SledRepository::open(dir.path()).unwrap();
        exercise(&repo);
    }

    #[test]
    fn cleanup_old_audits_deletes_only_expired_rows() {
        use reconx_core::model::{ActionAudit, ActionKind, ActionStatus};
        use reconx_core::types::ActionId;

        let repo = InMemoryRepository::new();
        let old_audit = ActionAudit {
            id: ActionId::new(),
            action_kind: ActionKind::MarkVerified,
            match_id: MatchId::new(),
            email_id: EmailId::new(),
            transaction_id: None,
            match_status_at_time: MatchStatus::AutoMatched,
            confidence_at_time: 0.9,
            actor: "system".into(),
            start_instant: Utc::now() - chrono::Duration::days(120),
            end_instant: None,
            duration_millis: None,
            status: ActionStatus::Success,
            outcome_label: None,
            message: None,
            error: None,
            retry_count: 0,
            payload_blob: None,
        };
        let mut recent_audit = old_audit.clone();
        recent_audit.id = ActionId::new();
        recent_audit.start_instant = Utc::now();

        repo.append_audit(&old_audit).unwrap();
        repo.append_audit(&recent_audit).unwrap();

        let deleted = repo.cleanup_old_audits(90).unwrap();
        assert_eq!(deleted, 1);
    }
}
