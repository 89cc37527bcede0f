//! In-memory [`Repository`] fake used by scoring, dispatcher, and
//! orchestrator tests — the same fake-over-trait pattern `reconx-sources`
//! uses for its pullers, applied to the storage seam.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use reconx_core::model::{
    ActionAudit, AuditPatch, CanonicalEmail, CanonicalTransaction, MatchResult, MatchStatus,
};
use reconx_core::types::{ActionId, EmailId, ExternalTxId, MatchId, SourceLabel, TransactionId, TransactionNaturalKey};
use reconx_core::{ReconError, ReconResult};

use crate::repository::{CandidateQuery, Repository};

#[derive(Default)]
struct State {
    emails: HashMap<EmailId, CanonicalEmail>,
    emails_by_message_id: HashMap<String, EmailId>,
    transactions: HashMap<TransactionId, CanonicalTransaction>,
    transactions_by_natural_key: HashMap<TransactionNaturalKey, TransactionId>,
    matches: HashMap<MatchId, MatchResult>,
    matches_by_email: HashMap<EmailId, MatchId>,
    audits: HashMap<ActionId, ActionAudit>,
}

/// Thread-safe, non-persistent [`Repository`]. Never loses data within a
/// process lifetime; does not survive a restart.
#[derive(Default)]
pub struct InMemoryRepository {
    state: Mutex<State>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("in-memory repository lock poisoned")
    }
}

impl Repository for InMemoryRepository {
    fn upsert_transaction(&self, tx: &CanonicalTransaction) -> ReconResult<bool> {
        let mut state = self.lock();
        let key = tx.natural_key();
        if state.transactions_by_natural_key.contains_key(&key) {
            return Ok(false);
        }
        state.transactions_by_natural_key.insert(key, tx.id);
        state.transactions.insert(tx.id, tx.clone());
        Ok(true)
    }

    fn upsert_email(&self, email: &CanonicalEmail) -> ReconResult<bool> {
        let mut state = self.lock();
        let key = email.message_id.as_str().to_string();
        if state.emails_by_message_id.contains_key(&key) {
            return Ok(false);
        }
        state.emails_by_message_id.insert(key, email.id);
        state.emails.insert(email.id, email.clone());
        Ok(true)
    }

    fn list_unmatched_emails(&self, limit: Option<usize>) -> ReconResult<Vec<CanonicalEmail>> {
        let state = self.lock();
        let mut out: Vec<CanonicalEmail> = state
            .emails
            .values()
            .filter(|e| !state.matches_by_email.contains_key(&e.id))
            .cloned()
            .collect();
        out.sort_by_key(|e| e.received_at);
        if let Some(limit) = limit {
            out.truncate(limit);
        }
        Ok(out)
    }

    fn find_candidate_transactions(&self, query: &CandidateQuery) -> ReconResult<Vec<CanonicalTransaction>> {
        let state = self.lock();
        let matched_ids: std::collections::HashSet<TransactionId> = state
            .matches
            .values()
            .filter(|m| m.status == MatchStatus::AutoMatched)
            .filter_map(|m| m.best_candidate.as_ref().map(|c| c.transaction.id))
            .collect();

        let window = chrono::Duration::hours(query.window_hours.max(0));
        let tolerance = (query.amount * rust_decimal::Decimal::try_from(query.amount_tolerance).unwrap_or_default()).abs();

        let out = state
            .transactions
            .values()
            .filter(|tx| (tx.amount - query.amount).abs() <= tolerance)
            .filter(|tx| {
                if !query.require_same_currency {
                    return true;
                }
                match &query.currency {
                    Some(currency) => &tx.currency == currency,
                    None => true,
                }
            })
            .filter(|tx| match query.instant {
                Some(instant) => (tx.instant - instant).abs() <= window,
                None => true,
            })
            .filter(|tx| !(query.exclude_matched && matched_ids.contains(&tx.id)))
            .cloned()
            .collect();
        Ok(out)
    }

    fn find_transaction_by_external_id(
        &self,
        source: &SourceLabel,
        external_id: &ExternalTxId,
    ) -> ReconResult<Option<CanonicalTransaction>> {
        let state = self.lock();
        let key = TransactionNaturalKey::new(source.clone(), external_id.clone());
        Ok(state
            .transactions_by_natural_key
            .get(&key)
            .and_then(|id| state.transactions.get(id))
            .cloned())
    }

    fn get_transaction(&self, id: TransactionId) -> ReconResult<Option<CanonicalTransaction>> {
        Ok(self.lock().transactions.get(&id).cloned())
    }

    fn get_email(&self, id: EmailId) -> ReconResult<Option<CanonicalEmail>> {
        Ok(self.lock().emails.get(&id).cloned())
    }

    fn get_match_for_email(&self, email_id: EmailId) -> ReconResult<Option<MatchResult>> {
        let state = self.lock();
        Ok(state
            .matches_by_email
            .get(&email_id)
            .and_then(|id| state.matches.get(id))
            .cloned())
    }

    fn write_match(&self, result: &MatchResult) -> ReconResult<MatchId> {
        let mut state = self.lock();
        // Rematch deletes-then-creates (§3 invariants): drop the
        // superseded row so a stale `AutoMatched` match can't keep
        // excluding its transaction from future candidate search.
        if let Some(old_id) = state.matches_by_email.insert(result.email_id, result.id) {
            if old_id != result.id {
                state.matches.remove(&old_id);
            }
        }
        state.matches.insert(result.id, result.clone());
        Ok(result.id)
    }

    fn mark_email_processed(&self, email_id: EmailId, error: Option<String>) -> ReconResult<()> {
        let mut state = self.lock();
        let email = state
            .emails
            .get_mut(&email_id)
            .ok_or_else(|| ReconError::NotFound(format!("email {email_id}")))?;
        email.processed = error.is_none();
        email.parsing_error = error;
        email.last_updated = Utc::now();
        Ok(())
    }

    fn append_audit(&self, audit: &ActionAudit) -> ReconResult<ActionId> {
        let mut state = self.lock();
        state.audits.insert(audit.id, audit.clone());
        Ok(audit.id)
    }

    fn update_audit(&self, id: ActionId, patch: &AuditPatch) -> ReconResult<()> {
        let mut state = self.lock();
        let audit = state
            .audits
            .get_mut(&id)
            .ok_or_else(|| ReconError::NotFound(format!("audit {id}")))?;
        if let Some(status) = patch.status {
            audit.status = status;
        }
        if let Some(outcome) = &patch.outcome_label {
            audit.outcome_label = Some(outcome.clone());
        }
        if let Some(message) = &patch.message {
            audit.message = Some(message.clone());
        }
        if let Some(error) = &patch.error {
            audit.error = Some(error.clone());
        }
        if let Some(end_instant) = patch.end_instant {
            audit.end_instant = Some(end_instant);
        }
        if let Some(duration_millis) = patch.duration_millis {
            audit.duration_millis = Some(duration_millis);
        }
        if let Some(payload) = &patch.payload_blob {
            audit.payload_blob = Some(payload.clone());
        }
        Ok(())
    }

    fn mark_transaction_verified(&self, transaction_id: TransactionId, verified_at: DateTime<Utc>) -> ReconResult<()> {
        let mut state = self.lock();
        let tx = state
            .transactions
            .get_mut(&transaction_id)
            .ok_or_else(|| ReconError::NotFound(format!("transaction {transaction_id}")))?;
        if tx.verified {
            return Ok(());
        }
        tx.verified = true;
        tx.verified_at = Some(verified_at);
        Ok(())
    }

    fn cleanup_old_audits(&self, retention_days: u32) -> ReconResult<usize> {
        let horizon = Utc::now() - chrono::Duration::days(retention_days as i64);
        let mut state = self.lock();
        let before = state.audits.len();
        state.audits.retain(|_, audit| audit.start_instant >= horizon);
        Ok(before - state.audits.len())
    }
}
