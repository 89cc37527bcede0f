//! One full reconciliation cycle (§4.8): Phase 1 (emails) → Phase 2
//! (transactions, one puller per bank source) → Phase 3 (match + act).
//! Each phase is isolated — a phase failure is recorded and the cycle
//! moves on rather than aborting outstanding work (§4.3).

use std::sync::Arc;
use std::time::Instant;

use chrono::{Duration as ChronoDuration, Utc};
use reconx_actions::ActionDispatcher;
use reconx_core::config::Config;
use reconx_core::ReconResult;
use reconx_metrics::{CycleAccumulator, Phase, PhaseRecord, RunRecord};
use reconx_resilience::CircuitBreaker;
use reconx_sources::{EmailExtractor, EmailFilterConfig, EmailPuller, TransactionPuller};
use reconx_storage::Repository;
use tracing::{error, warn};

use crate::ingest::{ingest_emails, ingest_transactions};
use crate::matching::match_one_email;

/// One bank's transaction feed paired with the breaker guarding it —
/// each external dependency gets its own circuit (§4.1).
pub struct TransactionSource {
    pub puller: Box<dyn TransactionPuller>,
    pub breaker: CircuitBreaker,
}

/// Everything a cycle needs, owned by the orchestrator and borrowed for
/// the duration of one run.
pub struct CycleDeps {
    pub email_puller: Box<dyn EmailPuller>,
    pub email_breaker: CircuitBreaker,
    pub extractor: Box<dyn EmailExtractor>,
    pub transaction_sources: Vec<TransactionSource>,
    pub repo: Arc<dyn Repository>,
    pub dispatcher: Option<ActionDispatcher>,
    pub filter_config: EmailFilterConfig,
}

/// Runs one cycle end to end and returns its metrics record. Never
/// returns `Err` for ordinary phase failures — those are captured in
/// the record's phases and status; only a panic-class bug would
/// surface as an `Err` here, and none of the phases are written to do
/// that.
pub async fn run_cycle(deps: &CycleDeps, config: &Config) -> ReconResult<RunRecord> {
    let mut accumulator = CycleAccumulator::start();
    let until = Utc::now();
    let since = until - ChronoDuration::hours(config.matching.time_window.max_hours);
    let batch_size = config.email_fetcher.batch_size as usize;
    let min_token_length = config.matching.fuzzy_match.min_token_length;

    run_phase(&mut accumulator, Phase::FetchEmails, async {
        let counts = ingest_emails(
            deps.email_puller.as_ref(),
            deps.extractor.as_ref(),
            &deps.email_breaker,
            &config.retry,
            deps.repo.as_ref(),
            &deps.filter_config,
            min_token_length,
            since,
            until,
            batch_size,
        )
        .await?;
        Ok(counts)
    })
    .await
    .map(|counts| accumulator.record_email_fetch(counts.fetched as u64, counts.new as u64))
    .unwrap_or(());

    for source in &deps.transaction_sources {
        let label = source.puller.source_label().to_string();
        let outcome = run_phase(&mut accumulator, Phase::PollTransactions, async {
            ingest_transactions(
                source.puller.as_ref(),
                &source.breaker,
                &config.retry,
                deps.repo.as_ref(),
                min_token_length,
                since,
                until,
                batch_size,
            )
            .await
        })
        .await;

        match outcome {
            Some(counts) => accumulator.record_transaction_fetch(counts.fetched as u64, counts.new as u64),
            None => warn!(source = %label, "transaction source skipped for this cycle"),
        }
    }

    let unmatched = deps.repo.list_unmatched_emails(None)?;
    let match_start = Instant::now();
    let mut match_error = None;

    for email in &unmatched {
        if let Err(e) = match_one_email(email, deps.repo.as_ref(), deps.dispatcher.as_ref(), config, &mut accumulator).await {
            error!(email_id = %email.id, error = %e, "email matching failed");
            match_error = Some(e.to_string());
        }
    }

    accumulator.record_phase(match match_error {
        Some(e) => PhaseRecord::failed(Phase::Match, match_start.elapsed().as_millis() as i64, e),
        None => PhaseRecord::ok(Phase::Match, match_start.elapsed().as_millis() as i64),
    });

    Ok(accumulator.finalize())
}

async fn run_phase<T, F>(accumulator: &mut CycleAccumulator, phase: Phase, fut: F) -> Option<T>
where
    F: std::future::Future<Output = ReconResult<T>>,
{
    let start = Instant::now();
    match fut.await {
        Ok(value) => {
            accumulator.record_phase(PhaseRecord::ok(phase, start.elapsed().as_millis() as i64));
            Some(value)
        }
        Err(e) => {
            error!(phase = phase.as_str(), error = %e, "phase failed");
            accumulator.record_phase(PhaseRecord::failed(phase, start.elapsed().as_millis() as i64, e.to_string()));
            None
        }
    }
}
