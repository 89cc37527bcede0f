//! Storage contract (C4). Every field the core pipeline reads or writes
//! goes through this trait — the scorer, dispatcher, and orchestrator
//! never touch a tree directly.
//!
//! Methods are synchronous: the reference backend ([`crate::sled_repo`])
//! is an embedded, memory-mapped store whose operations never block on
//! network I/O, so there is nothing for an `async fn` to yield on here —
//! unlike the source pullers in `reconx-sources`, which do cross a
//! network boundary and are `async`.

use chrono::{DateTime, Utc};
use reconx_core::model::{ActionAudit, AuditPatch, CanonicalEmail, CanonicalTransaction, MatchResult};
use reconx_core::types::{ActionId, EmailId, ExternalTxId, MatchId, SourceLabel, TransactionId};
use reconx_core::ReconResult;

/// Parameters for [`Repository::find_candidate_transactions`], mirroring
/// the filter described for candidate search.
#[derive(Clone, Debug)]
pub struct CandidateQuery {
    pub amount: rust_decimal::Decimal,
    pub currency: Option<String>,
    pub instant: Option<DateTime<Utc>>,
    pub window_hours: i64,
    pub amount_tolerance: f64,
    pub require_same_currency: bool,
    pub exclude_matched: bool,
}

pub trait Repository: Send + Sync {
    /// Returns `true` if a new row was created, `false` on a pre-existing
    /// `(source, externalId)` — the existing row is left untouched.
    fn upsert_transaction(&self, tx: &CanonicalTransaction) -> ReconResult<bool>;

    /// Returns `true` if a new row was created, `false` on a pre-existing
    /// `messageId`.
    fn upsert_email(&self, email: &CanonicalEmail) -> ReconResult<bool>;

    /// Oldest first. `limit` of `None` returns every unmatched email.
    fn list_unmatched_emails(&self, limit: Option<usize>) -> ReconResult<Vec<CanonicalEmail>>;

    fn find_candidate_transactions(&self, query: &CandidateQuery) -> ReconResult<Vec<CanonicalTransaction>>;

    fn find_transaction_by_external_id(
        &self,
        source: &SourceLabel,
        external_id: &ExternalTxId,
    ) -> ReconResult<Option<CanonicalTransaction>>;

    fn get_transaction(&self, id: TransactionId) -> ReconResult<Option<CanonicalTransaction>>;

    fn get_email(&self, id: EmailId) -> ReconResult<Option<CanonicalEmail>>;

    fn get_match_for_email(&self, email_id: EmailId) -> ReconResult<Option<MatchResult>>;

    /// Creates or atomically replaces the match row for `result.email_id`.
    fn write_match(&self, result: &MatchResult) -> ReconResult<MatchId>;

    /// `error = None` marks the email fully processed.
    fn mark_email_processed(&self, email_id: EmailId, error: Option<String>) -> ReconResult<()>;

    fn append_audit(&self, audit: &ActionAudit) -> ReconResult<ActionId>;

    fn update_audit(&self, id: ActionId, patch: &AuditPatch) -> ReconResult<()>;

    /// Idempotent: a second call with the same or a later `verified_at`
    /// is a no-op.
    fn mark_transaction_verified(&self, transaction_id: TransactionId, verified_at: DateTime<Utc>) -> ReconResult<()>;

    /// Deletes audit rows whose `start_instant` is older than
    /// `retention_days` before now; returns the number deleted.
    fn cleanup_old_audits(&self, retention_days: u32) -> ReconResult<usize>;
}
