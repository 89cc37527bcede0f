//! Wraps a puller's fetch in the resilience primitives (§4.1
//! Composition): retries happen inside one logical call to the breaker,
//! so exhausted retries surface as a single failure signal to it.

use chrono::{DateTime, Utc};
use reconx_core::config::RetryConfig;
use reconx_core::ReconResult;
use reconx_resilience::{retry_recon, CircuitBreaker};

use crate::puller::{EmailPuller, TransactionPuller};
use crate::raw::{RawEmail, RawTransaction};

pub async fn resilient_email_fetch(
    puller: &dyn EmailPuller,
    breaker: &CircuitBreaker,
    retry_config: &RetryConfig,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
    limit: usize,
    offset: usize,
) -> ReconResult<Vec<RawEmail>> {
    breaker
        .call(retry_recon(puller.source_label(), retry_config, || {
            puller.fetch(since, until, limit, offset)
        }))
        .await
}

pub async fn resilient_transaction_fetch(
    puller: &dyn TransactionPuller,
    breaker: &CircuitBreaker,
    retry_config: &RetryConfig,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
    limit: usize,
    offset: usize,
) -> ReconResult<Vec<RawTransaction>> {
    breaker
        .call(retry_recon(puller.source_label(), retry_config, || {
            puller.fetch(since, until, limit, offset)
        }))
        .await
}
