//! sled-backed [`Repository`] implementation.
//!
//! Named trees:
//!   emails                    — EmailId bytes       → bincode(CanonicalEmail)
//!   emails_by_message_id      — messageId utf8 bytes → EmailId bytes
//!   transactions              — TransactionId bytes → bincode(CanonicalTransaction)
//!   transactions_by_natural_key — "source\x1fexternalId" → TransactionId bytes
//!   matches                   — MatchId bytes        → bincode(MatchResult)
//!   matches_by_email          — EmailId bytes        → MatchId bytes
//!   audits                    — ActionId bytes       → bincode(ActionAudit)
//!   meta                      — utf8 key bytes       → raw bytes
//!
//! Range-style queries (candidate search, unmatched-email listing, audit
//! cleanup) have no native secondary index in sled, so they scan the
//! owning tree and apply an in-memory predicate — the same tradeoff the
//! rest of the pipeline already assumes for an embedded single-node
//! store.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reconx_core::model::{
    ActionAudit, AuditPatch, CanonicalEmail, CanonicalTransaction, MatchResult, MatchStatus,
};
use reconx_core::types::{ActionId, EmailId, ExternalTxId, MatchId, SourceLabel, TransactionId, TransactionNaturalKey};
use reconx_core::{ReconError, ReconResult};

use crate::repository::{CandidateQuery, Repository};

pub struct SledRepository {
    _db: sled::Db,
    emails: sled::Tree,
    emails_by_message_id: sled::Tree,
    transactions: sled::Tree,
    transactions_by_natural_key: sled::Tree,
    matches: sled::Tree,
    matches_by_email: sled::Tree,
    audits: sled::Tree,
    meta: sled::Tree,
}

impl SledRepository {
    pub fn open<P: AsRef<Path>>(path: P) -> ReconResult<Self> {
        let db = sled::open(path)?;
        Ok(Self {
            emails: db.open_tree("emails")?,
            emails_by_message_id: db.open_tree("emails_by_message_id")?,
            transactions: db.open_tree("transactions")?,
            transactions_by_natural_key: db.open_tree("transactions_by_natural_key")?,
            matches: db.open_tree("matches")?,
            matches_by_email: db.open_tree("matches_by_email")?,
            audits: db.open_tree("audits")?,
            meta: db.open_tree("meta")?,
            _db: db,
        })
    }

    pub fn flush(&self) -> ReconResult<()> {
        self._db.flush()?;
        Ok(())
    }

    fn get_transaction_bytes(&self, id: TransactionId) -> ReconResult<Option<CanonicalTransaction>> {
        match self.transactions.get(id.as_uuid().as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }
}

impl Repository for SledRepository {
    fn upsert_transaction(&self, tx: &CanonicalTransaction) -> ReconResult<bool> {
        let key = tx.natural_key().storage_key();
        if self.transactions_by_natural_key.contains_key(key.as_bytes())? {
            tracing::debug!(external_id = %tx.external_id, "transaction already present, skipping upsert");
            return Ok(false);
        }
        let bytes = bincode::serialize(tx)?;
        self.transactions.insert(tx.id.as_uuid().as_bytes(), bytes)?;
        self.transactions_by_natural_key
            .insert(key.as_bytes(), tx.id.as_uuid().as_bytes().to_vec())?;
        Ok(true)
    }

    fn upsert_email(&self, email: &CanonicalEmail) -> ReconResult<bool> {
        let key = email.message_id.as_str();
        if self.emails_by_message_id.contains_key(key.as_bytes())? {
            tracing::debug!(message_id = %email.message_id, "email already present, skipping upsert");
            return Ok(false);
        }
        let bytes = bincode::serialize(email)?;
        self.emails.insert(email.id.as_uuid().as_bytes(), bytes)?;
        self.emails_by_message_id
            .insert(key.as_bytes(), email.id.as_uuid().as_bytes().to_vec())?;
        Ok(true)
    }

    fn list_unmatched_emails(&self, limit: Option<usize>) -> ReconResult<Vec<CanonicalEmail>> {
        let mut out = Vec::new();
        for item in self.emails.iter() {
            let (key, bytes) = item?;
            let mut id_bytes = [0u8; 16];
            id_bytes.copy_from_slice(&key);
            let email_id = EmailId::from_uuid(uuid::Uuid::from_bytes(id_bytes));
            if self.matches_by_email.contains_key(email_id.as_uuid().as_bytes())? {
                continue;
            }
            let email: CanonicalEmail = bincode::deserialize(&bytes)?;
            out.push(email);
        }
        out.sort_by_key(|e| e.received_at);
        if let Some(limit) = limit {
            out.truncate(limit);
        }
        Ok(out)
    }

    fn find_candidate_transactions(&self, query: &CandidateQuery) -> ReconResult<Vec<CanonicalTransaction>> {
        let matched_ids = self.auto_matched_transaction_ids()?;
        let window = Duration::from_secs((query.window_hours.max(0) as u64) * 3600);
        let tolerance = query.amount * rust_decimal::Decimal::try_from(query.amount_tolerance).unwrap_or_default();
        let tolerance = tolerance.abs();

        let mut out = Vec::new();
        for item in self.transactions.iter() {
            let (_, bytes) = item?;
            let tx: CanonicalTransaction = bincode::deserialize(&bytes)?;

            if (tx.amount - query.amount).abs() > tolerance {
                continue;
            }
            if query.require_same_currency {
                if let Some(currency) = &query.currency {
                    if &tx.currency != currency {
                        continue;
                    }
                }
            }
            if let Some(instant) = query.instant {
                let diff = if tx.instant >= instant {
                    tx.instant - instant
                } else {
                    instant - tx.instant
                };
                if diff.to_std().unwrap_or(Duration::MAX) > window {
                    continue;
                }
            }
            if query.exclude_matched && matched_ids.contains(&tx.id) {
                continue;
            }
            out.push(tx);
        }
        Ok(out)
    }

    fn find_transaction_by_external_id(
        &self,
        source: &SourceLabel,
        external_id: &ExternalTxId,
    ) -> ReconResult<Option<CanonicalTransaction>> {
        let key = TransactionNaturalKey::new(source.clone(), external_id.clone()).storage_key();
        match self.transactions_by_natural_key.get(key.as_bytes())? {
            Some(id_bytes) => {
                let mut arr = [0u8; 16];
                arr.copy_from_slice(&id_bytes);
                let id = TransactionId::from_uuid(uuid::Uuid::from_bytes(arr));
                self.get_transaction_bytes(id)
            }
            None => Ok(None),
        }
    }

    fn get_transaction(&self, id: TransactionId) -> ReconResult<Option<CanonicalTransaction>> {
        self.get_transaction_bytes(id)
    }

    fn get_email(&self, id: EmailId) -> ReconResult<Option<CanonicalEmail>> {
        match self.emails.get(id.as_uuid().as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn get_match_for_email(&self, email_id: EmailId) -> ReconResult<Option<MatchResult>> {
        match self.matches_by_email.get(email_id.as_uuid().as_bytes())? {
            Some(id_bytes) => {
                let mut arr = [0u8; 16];
                arr.copy_from_slice(&id_bytes);
                let match_id = MatchId::from_uuid(uuid::Uuid::from_bytes(arr));
                match self.matches.get(match_id.as_uuid().as_bytes())? {
                    Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
                    None => Ok(None),
                }
            }
            None => Ok(None),
        }
    }

    fn write_match(&self, result: &MatchResult) -> ReconResult<MatchId> {
        // Rematch deletes-then-creates (§3 invariants): drop the
        // superseded row so a stale `AutoMatched` match can't keep
        // excluding its transaction from future candidate search.
        if let Some(old_id_bytes) = self
            .matches_by_email
            .get(result.email_id.as_uuid().as_bytes())?
        {
            if old_id_bytes.as_ref() != result.id.as_uuid().as_bytes() {
                self.matches.remove(old_id_bytes)?;
            }
        }
        let bytes = bincode::serialize(result)?;
        self.matches.insert(result.id.as_uuid().as_bytes(), bytes)?;
        self.matches_by_email
            .insert(result.email_id.as_uuid().as_bytes(), result.id.as_uuid().as_bytes().to_vec())?;
        Ok(result.id)
    }

    fn mark_email_processed(&self, email_id: EmailId, error: Option<String>) -> ReconResult<()> {
        let key = email_id.as_uuid();
        let key = key.as_bytes();
        let Some(bytes) = self.emails.get(key)? else {
            return Err(ReconError::NotFound(format!("email {email_id}")));
        };
        let mut email: CanonicalEmail = bincode::deserialize(&bytes)?;
        email.processed = error.is_none();
        email.parsing_error = error;
        email.last_updated = Utc::now();
        let bytes = bincode::serialize(&email)?;
        self.emails.insert(key, bytes)?;
        Ok(())
    }

    fn append_audit(&self, audit: &ActionAudit) -> ReconResult<ActionId> {
        let bytes = bincode::serialize(audit)?;
        self.audits.insert(audit.id.as_uuid().as_bytes(), bytes)?;
        Ok(audit.id)
    }

    fn update_audit(&self, id: ActionId, patch: &AuditPatch) -> ReconResult<()> {
        let key = id.as_uuid();
        let key = key.as_bytes();
        let Some(bytes) = self.audits.get(key)? else {
            return Err(ReconError::NotFound(format!("audit {id}")));
        };
        let mut audit: ActionAudit = bincode::deserialize(&bytes)?;
        apply_audit_patch(&mut audit, patch);
        let bytes = bincode::serialize(&audit)?;
        self.audits.insert(key, bytes)?;
        Ok(())
    }

    fn mark_transaction_verified(&self, transaction_id: TransactionId, verified_at: DateTime<Utc>) -> ReconResult<()> {
        let key = transaction_id.as_uuid();
        let key = key.as_bytes();
        let Some(bytes) = self.transactions.get(key)? else {
            return Err(ReconError::NotFound(format!("transaction {transaction_id}")));
        };
        let mut tx: CanonicalTransaction = bincode::deserialize(&bytes)?;
        if tx.verified {
            return Ok(());
        }
        tx.verified = true;
        tx.verified_at = Some(verified_at);
        let bytes = bincode::serialize(&tx)?;
        self.transactions.insert(key, bytes)?;
        Ok(())
    }

    fn cleanup_old_audits(&self, retention_days: u32) -> ReconResult<usize> {
        let horizon = Utc::now() - chrono::Duration::days(retention_days as i64);
        let mut to_delete = Vec::new();
        for item in self.audits.iter() {
            let (key, bytes) = item?;
            let audit: ActionAudit = bincode::deserialize(&bytes)?;
            if audit.start_instant < horizon {
                to_delete.push(key);
            }
        }
        let deleted = to_delete.len();
        for key in to_delete {
            self.audits.remove(key)?;
        }
        tracing::info!(deleted, retention_days, "cleaned up old action audits");
        Ok(deleted)
    }
}

impl SledRepository {
    fn auto_matched_transaction_ids(&self) -> ReconResult<std::collections::HashSet<TransactionId>> {
        let mut out = std::collections::HashSet::new();
        for item in self.matches.iter() {
            let (_, bytes) = item?;
            let m: MatchResult = bincode::deserialize(&bytes)?;
            if m.status != MatchStatus::AutoMatched {
                continue;
            }
            if let Some(candidate) = &m.best_candidate {
                out.insert(candidate.transaction.id);
            }
        }
        Ok(out)
    }
}

fn apply_audit_patch(audit: &mut ActionAudit, patch: &AuditPatch) {
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
}
