//! Background cycle driver (§4.8, §4.9): a ticking loop that runs
//! [`crate::cycle::run_cycle`] on a configurable interval, a manual
//! trigger that shares the same concurrent-cycle guard, and a
//! replace-not-append rematch entry point for a single email.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reconx_core::config::Config;
use reconx_core::error::ReconError;
use reconx_core::types::EmailId;
use reconx_core::ReconResult;
use reconx_metrics::MetricsRegistry;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cycle::{run_cycle, CycleDeps};
use crate::matching::match_one_email;
use crate::status::{StatusSnapshot, TriggerOutcome};

/// Owns the deps for the process lifetime; cheap to clone since every
/// field is an `Arc` or a plain value.
#[derive(Clone)]
struct Shared {
    deps: Arc<CycleDeps>,
    config: Arc<Config>,
    metrics: Arc<MetricsRegistry>,
    cycle_lock: Arc<Mutex<()>>,
}

pub struct Orchestrator {
    shared: Shared,
    shutdown: Arc<Notify>,
    stopped: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl Orchestrator {
    /// Builds the orchestrator and spawns its background loop. The
    /// first cycle fires immediately unless `email_fetcher.start_immediately`
    /// is `false`, in which case it waits one full interval first.
    pub fn start(deps: CycleDeps, config: Config, metrics: Arc<MetricsRegistry>) -> Self {
        let shared = Shared {
            deps: Arc::new(deps),
            config: Arc::new(config),
            metrics,
            cycle_lock: Arc::new(Mutex::new(())),
        };
        let shutdown = Arc::new(Notify::new());
        let stopped = Arc::new(AtomicBool::new(false));

        let task = tokio::spawn(background_loop(shared.clone(), shutdown.clone(), stopped.clone()));

        Self {
            shared,
            shutdown,
            stopped,
            task: Some(task),
        }
    }

    /// Signals the background loop to stop and waits up to
    /// `stop_grace_secs` for the in-flight cycle, if any, to finish.
    pub async fn stop(mut self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.shutdown.notify_one();

        if let Some(task) = self.task.take() {
            let grace = Duration::from_secs(self.shared.config.orchestrator.stop_grace_secs);
            if tokio::time::timeout(grace, task).await.is_err() {
                warn!("orchestrator did not stop within the grace period");
            }
        }
    }

    /// Runs a cycle immediately, sharing the concurrent-cycle guard
    /// with the ticking loop. Returns `AlreadyInProgress` rather than
    /// queuing behind a cycle that is already running (§4.9).
    pub async fn trigger_cycle(&self) -> TriggerOutcome {
        match self.shared.cycle_lock.try_lock() {
            Ok(guard) => TriggerOutcome::Completed(run_guarded_cycle(&self.shared, guard).await),
            Err(_) => {
                info!("manual trigger skipped: a cycle is already in progress");
                TriggerOutcome::AlreadyInProgress
            }
        }
    }

    /// Re-runs Phase 3 for a single email, replacing its match row
    /// outright rather than appending an alternative (§4.9 "manual
    /// rematch"). Post-match actions re-run by default; pass
    /// `skip_actions = true` to land only the recomputed match.
    pub async fn rematch(&self, email_id: EmailId, skip_actions: bool) -> ReconResult<reconx_core::model::MatchResult> {
        let _guard = self.shared.cycle_lock.lock().await;

        let email = self
            .shared
            .deps
            .repo
            .get_email(email_id)?
            .ok_or_else(|| ReconError::NotFound(format!("email {email_id}")))?;

        let dispatcher = if skip_actions { None } else { self.shared.deps.dispatcher.as_ref() };

        let mut accumulator = reconx_metrics::CycleAccumulator::start();
        match_one_email(&email, self.shared.deps.repo.as_ref(), dispatcher, &self.shared.config, &mut accumulator).await
    }

    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            cycle_in_progress: self.shared.cycle_lock.try_lock().is_err(),
            latest_cycle: self.shared.metrics.latest(),
            success_rate_last_24h: self.shared.metrics.success_rate_last_24h(),
            average_transactions_per_cycle: self.shared.metrics.average_transactions_per_cycle(),
        }
    }
}

async fn background_loop(shared: Shared, shutdown: Arc<Notify>, stopped: Arc<AtomicBool>) {
    let interval_secs = shared.config.orchestrator.cycle_interval_secs;
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    if !shared.config.email_fetcher.start_immediately {
        ticker.tick().await;
    }

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if stopped.load(Ordering::SeqCst) {
                    break;
                }
                match shared.cycle_lock.try_lock() {
                    Ok(guard) => {
                        run_guarded_cycle(&shared, guard).await;
                    }
                    Err(_) => warn!("scheduled cycle skipped: previous cycle still in progress"),
                }
            }
            _ = shutdown.notified() => {
                info!("orchestrator background loop shutting down");
                break;
            }
        }
    }
}

async fn run_guarded_cycle(shared: &Shared, guard: tokio::sync::MutexGuard<'_, ()>) -> reconx_metrics::RunRecord {
    let record = match run_cycle(&shared.deps, &shared.config).await {
        Ok(record) => record,
        Err(e) => {
            warn!(error = %e, "cycle runner returned an error outside normal phase handling");
            let mut accumulator = reconx_metrics::CycleAccumulator::start();
            accumulator.record_phase(reconx_metrics::PhaseRecord::failed(reconx_metrics::Phase::Match, 0, e.to_string()));
            accumulator.finalize()
        }
    };
    drop(guard);

    let error_backoff = shared.config.orchestrator.error_backoff_secs;
    if record.status == reconx_metrics::CycleStatus::Failed && error_backoff > 0 {
        tokio::time::sleep(Duration::from_secs(error_backoff)).await;
    }

    shared.metrics.push(record.clone());
    record
}
