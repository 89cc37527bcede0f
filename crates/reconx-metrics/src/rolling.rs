//! Bounded rolling window of recent cycles and the aggregates exposed by
//! the status surface (§4.9). A single writer (the orchestrator) pushes;
//! readers take an immutable snapshot.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reconx_core::constants::METRICS_ROLLING_WINDOW;
use tracing::info;

use crate::run_record::{CycleStatus, Phase, RunRecord};

/// Each cycle's `RunRecord` is emitted as one structured log event per
/// phase and one summary event per cycle (§4.9 "Structured emission") —
/// the same numbers are visible through the ordinary log stream without
/// a metrics-exporter surface.
pub fn emit_structured(record: &RunRecord) {
    for phase in &record.phases {
        info!(
            cycle_id = %record.cycle_id,
            phase = phase.phase.as_str(),
            duration_millis = phase.duration_millis,
            error = ?phase.error,
            "cycle_phase"
        );
    }
    info!(
        cycle_id = %record.cycle_id,
        status = ?record.status,
        duration_millis = record.duration_millis(),
        emails_fetched = record.emails_fetched,
        emails_new = record.emails_new,
        transactions_fetched = record.transactions_fetched,
        transactions_new = record.transactions_new,
        emails_matched = record.emails_matched,
        auto_matched = record.status_counts.auto_matched,
        needs_review = record.status_counts.needs_review,
        rejected = record.status_counts.rejected,
        no_candidates = record.status_counts.no_candidates,
        avg_confidence = record.avg_confidence,
        "cycle_summary"
    );
}

pub struct MetricsRegistry {
    window: Mutex<VecDeque<RunRecord>>,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            window: Mutex::new(VecDeque::with_capacity(METRICS_ROLLING_WINDOW)),
        }
    }

    /// Pushes a completed cycle's record, evicting the oldest once the
    /// window (default 100) is full, and emits the structured log events.
    pub fn push(&self, record: RunRecord) {
        emit_structured(&record);
        let mut window = self.window.lock().expect("metrics window mutex poisoned");
        if window.len() >= METRICS_ROLLING_WINDOW {
            window.pop_front();
        }
        window.push_back(record);
    }

    pub fn latest(&self) -> Option<RunRecord> {
        self.window.lock().expect("metrics window mutex poisoned").back().cloned()
    }

    pub fn snapshot(&self) -> Vec<RunRecord> {
        self.window.lock().expect("metrics window mutex poisoned").iter().cloned().collect()
    }

    /// Fraction of cycles in the last 24h whose status was `Success`
    /// (cycles with no `RunRecord` at all in that window return `1.0`,
    /// matching "nothing ran, nothing failed").
    pub fn success_rate_last_24h(&self) -> f64 {
        self.success_rate_since(Utc::now() - ChronoDuration::hours(24))
    }

    pub fn success_rate_since(&self, since: DateTime<Utc>) -> f64 {
        let window = self.window.lock().expect("metrics window mutex poisoned");
        let recent: Vec<&RunRecord> = window.iter().filter(|r| r.started_at >= since).collect();
        if recent.is_empty() {
            return 1.0;
        }
        let successes = recent.iter().filter(|r| r.status == CycleStatus::Success).count();
        successes as f64 / recent.len() as f64
    }

    pub fn average_transactions_per_cycle(&self) -> f64 {
        let window = self.window.lock().expect("metrics window mutex poisoned");
        if window.is_empty() {
            return 0.0;
        }
        let total: u64 = window.iter().map(|r| r.transactions_new).sum();
        total as f64 / window.len() as f64
    }

    pub fn average_phase_duration_millis(&self, phase: Phase) -> f64 {
        let window = self.window.lock().expect("metrics window mutex poisoned");
        let durations: Vec<i64> = window.iter().filter_map(|r| r.phase_duration(phase)).collect();
        if durations.is_empty() {
            return 0.0;
        }
        durations.iter().sum::<i64>() as f64 / durations.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::CycleAccumulator;
    use crate::run_record::PhaseRecord;

    fn cycle(status_ok: bool) -> RunRecord {
        let mut acc = CycleAccumulator::start();
        if status_ok {
            acc.record_phase(PhaseRecord::ok(Phase::FetchEmails, 10));
        } else {
            acc.record_phase(PhaseRecord::failed(Phase::FetchEmails, 10, "boom"));
        }
        acc.finalize()
    }

    #[test]
    fn rolling_window_evicts_oldest_beyond_capacity() {
        let registry = MetricsRegistry::new();
        for _ in 0..(METRICS_ROLLING_WINDOW + 5) {
            registry.push(cycle(true));
        }
        assert_eq!(registry.snapshot().len(), METRICS_ROLLING_WINDOW);
    }

    #[test]
    fn success_rate_reflects_failed_cycles() {
        let registry = MetricsRegistry::new();
        registry.push(cycle(true));
        registry.push(cycle(false));
        let rate = registry.success_rate_last_24h();
        assert!((rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn empty_window_reports_full_success_rate() {
        let registry = MetricsRegistry::new();
        assert_eq!(registry.success_rate_last_24h(), 1.0);
    }
}
