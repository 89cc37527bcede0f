//! Uniform puller contract (§4.3). Safe, but not required, to call
//! concurrently — the orchestrator serializes calls per source.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reconx_core::ReconResult;

use crate::raw::{RawEmail, RawTransaction};

#[async_trait]
pub trait EmailPuller: Send + Sync {
    fn source_label(&self) -> &str;

    async fn fetch(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        limit: usize,
        offset: usize,
    ) -> ReconResult<Vec<RawEmail>>;

    async fn get_by_id(&self, message_id: &str) -> ReconResult<Option<RawEmail>>;

    async fn validate(&self) -> ReconResult<()>;
}

#[async_trait]
pub trait TransactionPuller: Send + Sync {
    fn source_label(&self) -> &str;

    async fn fetch(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        limit: usize,
        offset: usize,
    ) -> ReconResult<Vec<RawTransaction>>;

    async fn get_by_id(&self, external_id: &str) -> ReconResult<Option<RawTransaction>>;

    async fn validate(&self) -> ReconResult<()>;
}
