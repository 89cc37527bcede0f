//! Phase 1 / Phase 2 pipelines (§4.8): resilient fetch → normalize →
//! idempotent upsert, wrapped so a handful of bad records never abort
//! the batch (§4.3).

use chrono::{DateTime, Utc};
use reconx_core::config::RetryConfig;
use reconx_core::ReconResult;
use reconx_normalize::canonicalize::{build_canonical_email, build_canonical_transaction, RawEmailFields, RawTransactionFields};
use reconx_resilience::CircuitBreaker;
use reconx_sources::{passes_filter, resilient_email_fetch, resilient_transaction_fetch};
use reconx_sources::{BatchCounts, EmailExtractor, EmailFilterConfig, EmailPuller, TransactionPuller};
use reconx_storage::Repository;
use tracing::{debug, warn};

/// Pulls one batch of emails, runs the pre-filter, hands survivors to
/// the extraction collaborator, canonicalizes, and upserts. Rejected
/// (filtered) emails are dropped without persistence (§4.3).
pub async fn ingest_emails(
    puller: &dyn EmailPuller,
    extractor: &dyn EmailExtractor,
    breaker: &CircuitBreaker,
    retry_config: &RetryConfig,
    repo: &dyn Repository,
    filter_config: &EmailFilterConfig,
    min_token_length: usize,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
    batch_size: usize,
) -> ReconResult<BatchCounts> {
    let raw = resilient_email_fetch(puller, breaker, retry_config, since, until, batch_size, 0).await?;

    let mut counts = BatchCounts {
        fetched: raw.len(),
        ..Default::default()
    };

    for email in raw {
        if !passes_filter(filter_config, &email.sender, &email.subject, &email.body) {
            debug!(message_id = %email.message_id, "email rejected by pre-filter");
            continue;
        }

        let extracted = match extractor.extract(&email.sender, &email.subject, &email.body).await {
            Ok(fields) => fields,
            Err(e) => {
                warn!(message_id = %email.message_id, error = %e, "email extraction failed");
                counts.failed += 1;
                continue;
            }
        };

        let canonical = build_canonical_email(RawEmailFields {
            message_id: &email.message_id,
            sender: &email.sender,
            subject: &email.subject,
            body: &email.body,
            received_at: email.received_at,
            extracted_amount: extracted.amount.as_deref(),
            extracted_currency: extracted.currency.as_deref(),
            extracted_reference: extracted.reference.as_deref(),
            extracted_account_segment: extracted.account_segment.as_deref(),
            extracted_instant: extracted.transaction_instant.as_deref(),
            extraction_confidence: Some(extracted.confidence),
            extraction_method: Some(extracted.method),
            transaction_type: extracted.transaction_type,
            is_alert: extracted.is_alert,
            min_token_length,
        });

        match repo.upsert_email(&canonical) {
            Ok(true) => {
                counts.new += 1;
                counts.stored += 1;
            }
            Ok(false) => counts.duplicate += 1,
            Err(e) => {
                warn!(message_id = %email.message_id, error = %e, "email upsert failed");
                counts.failed += 1;
            }
        }
    }

    Ok(counts)
}

/// Pulls one batch of transactions and upserts them idempotently by
/// `(sourceLabel, externalId)` (§4.3, §4.4).
pub async fn ingest_transactions(
    puller: &dyn TransactionPuller,
    breaker: &CircuitBreaker,
    retry_config: &RetryConfig,
    repo: &dyn Repository,
    min_token_length: usize,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
    batch_size: usize,
) -> ReconResult<BatchCounts> {
    let raw = resilient_transaction_fetch(puller, breaker, retry_config, since, until, batch_size, 0).await?;

    let mut counts = BatchCounts {
        fetched: raw.len(),
        ..Default::default()
    };

    for tx in raw {
        let canonical = build_canonical_transaction(RawTransactionFields {
            source: puller.source_label(),
            external_id: &tx.external_id,
            amount: tx.amount,
            currency: &tx.currency,
            instant: tx.instant,
            description: tx.description.as_deref(),
            reference: tx.reference.as_deref(),
            account_ref: tx.account_ref.as_deref(),
            counterparty_name: tx.counterparty_name.as_deref(),
            counterparty_email: tx.counterparty_email.as_deref(),
            status: &tx.status,
            min_token_length,
        });

        match repo.upsert_transaction(&canonical) {
            Ok(true) => {
                counts.new += 1;
                counts.stored += 1;
            }
            Ok(false) => counts.duplicate += 1,
            Err(e) => {
                warn!(external_id = %tx.external_id, error = %e, "transaction upsert failed");
                counts.failed += 1;
            }
        }
    }

    Ok(counts)
}
