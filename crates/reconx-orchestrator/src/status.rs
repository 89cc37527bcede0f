//! Status/metrics surface (§4.9) handed back to callers — the manual
//! trigger and rematch entry points, and whatever out-of-process
//! surface ends up fronting this orchestrator.

use reconx_metrics::RunRecord;

#[derive(Clone, Debug)]
pub struct StatusSnapshot {
    pub cycle_in_progress: bool,
    pub latest_cycle: Option<RunRecord>,
    pub success_rate_last_24h: f64,
    pub average_transactions_per_cycle: f64,
}

/// Result of a manually requested cycle (§4.9 "manual trigger").
#[derive(Debug)]
pub enum TriggerOutcome {
    Completed(RunRecord),
    AlreadyInProgress,
}
