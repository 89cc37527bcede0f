//! End-to-end scenario tests run against in-memory fakes (no network,
//! no real storage) — one full cycle per scenario, driving the real
//! retriever/scorer/ranker/decision/dispatch path through
//! [`reconx_orchestrator::run_cycle`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reconx_actions::{ActionDispatcher, IntegrationConfig};
use reconx_core::config::Config;
use reconx_core::model::ExtractionMethod;
use reconx_core::ReconResult;
use reconx_normalize::canonicalize::{build_canonical_email, RawEmailFields};
use reconx_orchestrator::{run_cycle, CycleDeps, Orchestrator, TransactionSource};
use reconx_resilience::CircuitBreaker;
use reconx_sources::{EmailExtractor, EmailFilterConfig, ExtractedFields, FlakyTransactionPuller, MockEmailPuller, MockTransactionPuller, RawEmail, RawTransaction};
use reconx_storage::{InMemoryRepository, Repository};
use rust_decimal_macros::dec;

/// Always returns the same extracted fields regardless of input —
/// enough to drive a deterministic pipeline without a real NLP/LLM
/// collaborator (mirrors [`reconx_sources::extraction::NullExtractor`]
/// but answers as an alert).
struct ScriptedExtractor {
    fields: ExtractedFields,
}

#[async_trait]
impl EmailExtractor for ScriptedExtractor {
    async fn extract(&self, _sender: &str, _subject: &str, _body: &str) -> ReconResult<ExtractedFields> {
        Ok(self.fields.clone())
    }
}

fn extracted_fields(amount: &str, reference: &str) -> ExtractedFields {
    ExtractedFields {
        amount: Some(amount.to_string()),
        currency: Some("NGN".into()),
        reference: Some(reference.to_string()),
        account_segment: Some("4321".into()),
        transaction_instant: Some(Utc::now().to_rfc3339()),
        transaction_type: None,
        confidence: 0.9,
        method: ExtractionMethod::Structured,
        is_alert: true,
    }
}

fn alert_email(amount: &str, reference: &str) -> (RawEmail, ScriptedExtractor) {
    let now = Utc::now();
    let email = RawEmail {
        message_id: format!("msg-{reference}"),
        sender: "alerts@gtbank.com".into(),
        subject: "Debit Alert".into(),
        body: "Your account was debited. Please review the transaction.".into(),
        received_at: now,
    };
    let extractor = ScriptedExtractor {
        fields: extracted_fields(amount, reference),
    };
    (email, extractor)
}

fn transaction(external_id: &str, amount: rust_decimal::Decimal, reference: &str) -> RawTransaction {
    RawTransaction {
        external_id: external_id.into(),
        amount,
        currency: "NGN".into(),
        instant: Utc::now(),
        description: Some("POS purchase".into()),
        reference: Some(reference.into()),
        account_ref: Some("4321".into()),
        counterparty_name: Some("Jane Doe".into()),
        counterparty_email: None,
        status: "success".into(),
    }
}

fn deps_with(
    email_puller: MockEmailPuller,
    extractor: ScriptedExtractor,
    transaction_puller: Box<dyn reconx_sources::TransactionPuller>,
    repo: Arc<InMemoryRepository>,
) -> CycleDeps {
    let repo: Arc<dyn Repository> = repo;
    CycleDeps {
        email_puller: Box::new(email_puller),
        email_breaker: CircuitBreaker::new("email", Default::default()),
        extractor: Box::new(extractor),
        transaction_sources: vec![TransactionSource {
            puller: transaction_puller,
            breaker: CircuitBreaker::new("bank", Default::default()),
        }],
        repo: repo.clone(),
        dispatcher: Some(ActionDispatcher::new(repo, IntegrationConfig::default(), std::time::Duration::from_secs(1))),
        filter_config: EmailFilterConfig::default(),
    }
}

#[tokio::test]
async fn exact_amount_and_reference_auto_matches() {
    let (email, extractor) = alert_email("5000.00", "INV-1001");
    let email_puller = MockEmailPuller::new("inbox");
    email_puller.seed(vec![email]);

    let tx_puller = MockTransactionPuller::new("gtbank");
    tx_puller.seed(vec![transaction("TX-1", dec!(5000.00), "INV-1001")]);

    let repo = Arc::new(InMemoryRepository::new());
    let deps = deps_with(email_puller, extractor, Box::new(tx_puller), repo.clone());
    let config = Config::default();

    let record = run_cycle(&deps, &config).await.unwrap();
    assert_eq!(record.emails_matched, 1);
    assert_eq!(record.status_counts.auto_matched, 1);
    assert!(repo.list_unmatched_emails(None).unwrap().is_empty(), "matched email must leave the unmatched queue");
}

#[tokio::test]
async fn no_nearby_transaction_yields_no_candidates() {
    let (email, extractor) = alert_email("5000.00", "INV-9999");
    let email_puller = MockEmailPuller::new("inbox");
    email_puller.seed(vec![email]);

    let tx_puller = MockTransactionPuller::new("gtbank");
    tx_puller.seed(vec![transaction("TX-2", dec!(75000.00), "UNRELATED")]);

    let repo = Arc::new(InMemoryRepository::new());
    let deps = deps_with(email_puller, extractor, Box::new(tx_puller), repo.clone());
    let config = Config::default();

    let record = run_cycle(&deps, &config).await.unwrap();
    assert_eq!(record.status_counts.no_candidates, 1);
}

#[tokio::test]
async fn two_equally_plausible_candidates_never_auto_match() {
    let (email, extractor) = alert_email("5000.00", "INV-2002");
    let email_puller = MockEmailPuller::new("inbox");
    email_puller.seed(vec![email]);

    let tx_puller = MockTransactionPuller::new("gtbank");
    tx_puller.seed(vec![
        transaction("TX-3", dec!(5000.00), "OTHER-A"),
        transaction("TX-4", dec!(5000.00), "OTHER-B"),
    ]);

    let repo = Arc::new(InMemoryRepository::new());
    let deps = deps_with(email_puller, extractor, Box::new(tx_puller), repo.clone());
    let config = Config::default();

    let record = run_cycle(&deps, &config).await.unwrap();
    // Both candidates score identically on amount alone with neither
    // reference nor account distinguishing them, so the decision must
    // not land on a spurious auto-match picked by array order.
    assert_eq!(record.status_counts.auto_matched, 0);
    assert_eq!(record.emails_matched, 1);
}

#[tokio::test]
async fn transient_failures_recover_without_losing_the_batch() {
    let (email, extractor) = alert_email("1200.00", "INV-3003");
    let email_puller = MockEmailPuller::new("inbox");
    email_puller.seed(vec![email]);

    let inner = MockTransactionPuller::new("gtbank");
    inner.seed(vec![transaction("TX-5", dec!(1200.00), "INV-3003")]);
    let flaky = FlakyTransactionPuller::new(inner, 2);

    let repo = Arc::new(InMemoryRepository::new());
    let deps = deps_with(email_puller, extractor, Box::new(flaky), repo.clone());
    let mut config = Config::default();
    config.retry.max_attempts = 5;
    config.retry.initial_delay_ms = 1;

    let record = run_cycle(&deps, &config).await.unwrap();
    assert_eq!(record.transactions_new, 1, "retry must eventually land the transaction");
    assert_eq!(record.status_counts.auto_matched, 1);
}

#[tokio::test]
async fn exhausted_retries_trip_the_circuit_without_panicking() {
    let (email, extractor) = alert_email("1200.00", "INV-4004");
    let email_puller = MockEmailPuller::new("inbox");
    email_puller.seed(vec![email]);

    let inner = MockTransactionPuller::new("gtbank");
    inner.seed(vec![transaction("TX-6", dec!(1200.00), "INV-4004")]);
    let flaky = FlakyTransactionPuller::new(inner, 100);

    let repo = Arc::new(InMemoryRepository::new());
    let deps = deps_with(email_puller, extractor, Box::new(flaky), repo.clone());
    let mut config = Config::default();
    config.retry.max_attempts = 2;
    config.retry.initial_delay_ms = 1;

    let record = run_cycle(&deps, &config).await.unwrap();
    assert_eq!(record.transactions_new, 0);
    assert_eq!(record.status_counts.no_candidates, 1);
}

#[tokio::test]
async fn manual_rematch_replaces_rather_than_appends() {
    let repo = Arc::new(InMemoryRepository::new());
    let now = Utc::now();

    let canonical_email = build_canonical_email(RawEmailFields {
        message_id: "msg-rematch-1",
        sender: "alerts@gtbank.com",
        subject: "Debit Alert",
        body: "Your account was debited.",
        received_at: now,
        extracted_amount: Some("900.00"),
        extracted_currency: Some("NGN"),
        extracted_reference: Some("INV-5005"),
        extracted_account_segment: Some("4321"),
        extracted_instant: Some(now.to_rfc3339()),
        extraction_confidence: Some(0.9),
        extraction_method: Some(ExtractionMethod::Structured),
        transaction_type: None,
        is_alert: true,
        min_token_length: 3,
    });
    let email_id = canonical_email.id;
    repo.upsert_email(&canonical_email).unwrap();

    let tx_puller = MockTransactionPuller::new("gtbank");
    tx_puller.seed(vec![transaction("TX-7", dec!(900.00), "INV-5005")]);
    let empty_email_puller = MockEmailPuller::new("inbox");

    let deps = deps_with(empty_email_puller, ScriptedExtractor { fields: extracted_fields("900.00", "INV-5005") }, Box::new(tx_puller), repo.clone());
    let config = Config::default();

    let first = run_cycle(&deps, &config).await.unwrap();
    assert_eq!(first.status_counts.auto_matched, 1);
    let first_match = repo.get_match_for_email(email_id).unwrap().expect("first cycle must write a match");

    let metrics = Arc::new(reconx_metrics::MetricsRegistry::new());
    let deps = deps_with(
        MockEmailPuller::new("inbox"),
        ScriptedExtractor { fields: extracted_fields("900.00", "INV-5005") },
        Box::new(MockTransactionPuller::new("gtbank")),
        repo.clone(),
    );
    let orchestrator = Orchestrator::start(deps, config, metrics);
    let rematched = orchestrator.rematch(email_id, true).await.unwrap();

    assert_eq!(rematched.status, first_match.status);
    let stored = repo.get_match_for_email(email_id).unwrap().expect("rematch must leave exactly one match row");
    assert_eq!(stored.id, rematched.id, "rematch replaces the row rather than appending beside it");

    orchestrator.stop().await;
}
