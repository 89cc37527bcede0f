//! Candidate retriever (C5). Queries storage for plausible transaction
//! candidates for a canonical email, repeats the predicates as a paranoid
//! post-filter, and truncates to `maxCandidates`.

use reconx_core::config::CandidateRetrievalConfig;
use reconx_core::model::CanonicalEmail;
use reconx_core::ReconResult;
use reconx_storage::{CandidateQuery, Repository};
use tracing::debug;

/// Default path: amount/time-window query against the configured
/// tolerance, default `windowHours` (48h unless overridden).
pub fn retrieve_candidates(
    repo: &dyn Repository,
    email: &CanonicalEmail,
    window_hours: i64,
    config: &CandidateRetrievalConfig,
) -> ReconResult<Vec<reconx_core::model::CanonicalTransaction>> {
    let Some(amount) = email.amount else {
        debug!(email_id = %email.id, "candidate retrieval skipped: email amount missing");
        return Ok(Vec::new());
    };

    let query = CandidateQuery {
        amount,
        currency: email.currency.clone(),
        instant: email.transaction_instant,
        window_hours,
        amount_tolerance: config.amount_tolerance_percent,
        require_same_currency: config.require_same_currency,
        exclude_matched: config.exclude_already_matched,
    };

    let fetched = repo.find_candidate_transactions(&query)?;
    let before = fetched.len();

    let filtered: Vec<_> = fetched
        .into_iter()
        .filter(|tx| passes_post_filter(email, tx, &query))
        .take(config.max_candidates)
        .collect();

    debug!(
        email_id = %email.id,
        before,
        after = filtered.len(),
        max_candidates = config.max_candidates,
        "candidate_retrieval"
    );

    Ok(filtered)
}

/// Alternate, tighter path (§4.5): amount + currency + the email's
/// composite-key hour bucket, with a fixed 1-hour window.
pub fn retrieve_candidates_by_composite_key(
    repo: &dyn Repository,
    email: &CanonicalEmail,
    config: &CandidateRetrievalConfig,
) -> ReconResult<Vec<reconx_core::model::CanonicalTransaction>> {
    let (Some(amount), Some(_key)) = (email.amount, email.composite_key.as_ref()) else {
        return Ok(Vec::new());
    };

    let query = CandidateQuery {
        amount,
        currency: email.currency.clone(),
        instant: email.transaction_instant,
        window_hours: 1,
        amount_tolerance: config.amount_tolerance_percent,
        require_same_currency: config.require_same_currency,
        exclude_matched: config.exclude_already_matched,
    };

    let fetched = repo.find_candidate_transactions(&query)?;
    Ok(fetched
        .into_iter()
        .filter(|tx| passes_post_filter(email, tx, &query))
        .take(config.max_candidates)
        .collect())
}

/// Repeats the storage-layer predicates so a retriever bug or a looser
/// backend implementation can never hand the scorer an out-of-window or
/// out-of-tolerance candidate (§4.5 "paranoid post-filter").
fn passes_post_filter(
    email: &CanonicalEmail,
    tx: &reconx_core::model::CanonicalTransaction,
    query: &CandidateQuery,
) -> bool {
    let diff = (tx.amount - query.amount).abs();
    let tolerance = (query.amount * rust_decimal::Decimal::try_from(query.amount_tolerance).unwrap_or_default()).abs();
    if diff > tolerance {
        return false;
    }

    if query.require_same_currency {
        if let Some(currency) = &query.currency {
            if &tx.currency != currency {
                return false;
            }
        }
    }

    if let Some(email_instant) = email.transaction_instant {
        let delta_hours = (tx.instant - email_instant).num_seconds().unsigned_abs() as f64 / 3600.0;
        if delta_hours > query.window_hours as f64 {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reconx_core::types::{EmailId, ExternalTxId, MessageId, SourceLabel, TransactionId};
    use reconx_storage::InMemoryRepository;
    use rust_decimal_macros::dec;

    fn email(amount: Option<rust_decimal::Decimal>) -> CanonicalEmail {
        CanonicalEmail {
            id: EmailId::new(),
            message_id: MessageId::new("m1"),
            sender: "alerts@bank.example".into(),
            subject: "Alert".into(),
            body: "body".into(),
            received_at: Utc::now(),
            amount,
            currency: Some("NGN".into()),
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
    fn missing_amount_returns_empty() {
        let repo = InMemoryRepository::new();
        let result = retrieve_candidates(&repo, &email(None), 48, &CandidateRetrievalConfig::default()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn finds_transaction_within_tolerance_and_window() {
        let repo = InMemoryRepository::new();
        let tx = reconx_core::model::CanonicalTransaction {
            id: TransactionId::new(),
            source: SourceLabel::new("mock"),
            external_id: ExternalTxId::new("ext-1"),
            amount: dec!(100.00),
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
        };
        repo.upsert_transaction(&tx).unwrap();

        let result = retrieve_candidates(&repo, &email(Some(dec!(100.00))), 48, &CandidateRetrievalConfig::default()).unwrap();
        assert_eq!(result.len(), 1);
    }
}
