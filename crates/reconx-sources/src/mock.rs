//! Deterministic, seedable in-memory pullers used in tests and local
//! development — the Null/InMemory fake pattern applied to source pullers
//! instead of a facade's repository dependencies.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reconx_core::ReconResult;

use crate::puller::{EmailPuller, TransactionPuller};
use crate::raw::{RawEmail, RawTransaction};

#[derive(Default)]
pub struct MockEmailPuller {
    label: String,
    records: RwLock<Vec<RawEmail>>,
}

impl MockEmailPuller {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            records: RwLock::new(Vec::new()),
        }
    }

    pub fn seed(&self, records: Vec<RawEmail>) {
        *self.records.write().expect("mock email puller lock poisoned") = records;
    }
}

#[async_trait]
impl EmailPuller for MockEmailPuller {
    fn source_label(&self) -> &str {
        &self.label
    }

    async fn fetch(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        limit: usize,
        offset: usize,
    ) -> ReconResult<Vec<RawEmail>> {
        let records = self.records.read().expect("mock email puller lock poisoned");
        let filtered: Vec<RawEmail> = records
            .iter()
            .filter(|e| e.received_at >= since && e.received_at <= until)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok(filtered)
    }

    async fn get_by_id(&self, message_id: &str) -> ReconResult<Option<RawEmail>> {
        let records = self.records.read().expect("mock email puller lock poisoned");
        Ok(records.iter().find(|e| e.message_id == message_id).cloned())
    }

    async fn validate(&self) -> ReconResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct MockTransactionPuller {
    label: String,
    records: RwLock<Vec<RawTransaction>>,
}

impl MockTransactionPuller {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            records: RwLock::new(Vec::new()),
        }
    }

    pub fn seed(&self, records: Vec<RawTransaction>) {
        *self.records.write().expect("mock transaction puller lock poisoned") = records;
    }
}

#[async_trait]
impl TransactionPuller for MockTransactionPuller {
    fn source_label(&self) -> &str {
        &self.label
    }

    async fn fetch(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        limit: usize,
        offset: usize,
    ) -> ReconResult<Vec<RawTransaction>> {
        let records = self.records.read().expect("mock transaction puller lock poisoned");
        let filtered: Vec<RawTransaction> = records
            .iter()
            .filter(|t| t.instant >= since && t.instant <= until)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok(filtered)
    }

    async fn get_by_id(&self, external_id: &str) -> ReconResult<Option<RawTransaction>> {
        let records = self.records.read().expect("mock transaction puller lock poisoned");
        Ok(records.iter().find(|t| t.external_id == external_id).cloned())
    }

    async fn validate(&self) -> ReconResult<()> {
        Ok(())
    }
}

/// Wraps a [`TransactionPuller`] so the first `fail_count` calls to
/// `fetch` return a transient error before delegating — used to exercise
/// the retry/circuit-breaker scenarios (S4, S5) without real I/O.
pub struct FlakyTransactionPuller<P: TransactionPuller> {
    inner: P,
    remaining_failures: std::sync::atomic::AtomicUsize,
}

impl<P: TransactionPuller> FlakyTransactionPuller<P> {
    pub fn new(inner: P, fail_count: usize) -> Self {
        Self {
            inner,
            remaining_failures: std::sync::atomic::AtomicUsize::new(fail_count),
        }
    }
}

#[async_trait]
impl<P: TransactionPuller> TransactionPuller for FlakyTransactionPuller<P> {
    fn source_label(&self) -> &str {
        self.inner.source_label()
    }

    async fn fetch(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        limit: usize,
        offset: usize,
    ) -> ReconResult<Vec<RawTransaction>> {
        use std::sync::atomic::Ordering;

        let remaining = self.remaining_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.remaining_failures.fetch_sub(1, Ordering::SeqCst);
            return Err(reconx_core::ReconError::TransientSource {
                source_label: self.inner.source_label().to_string(),
                detail: "simulated transient failure".into(),
            });
        }

        self.inner.fetch(since, until, limit, offset).await
    }

    async fn get_by_id(&self, external_id: &str) -> ReconResult<Option<RawTransaction>> {
        self.inner.get_by_id(external_id).await
    }

    async fn validate(&self) -> ReconResult<()> {
        self.inner.validate().await
    }
}
