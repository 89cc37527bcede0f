//! reconx-metrics
//!
//! Per-cycle metrics accumulator (C9): status-bucket totals,
//! confidence statistics and histogram, rule contribution tracking, a
//! bounded rolling window of recent cycles, and the structured-log
//! emission that substitutes for a full metrics-exporter surface.

pub mod accumulator;
pub mod histogram;
pub mod rolling;
pub mod rule_stats;
pub mod run_record;

pub use accumulator::CycleAccumulator;
pub use histogram::ConfidenceHistogram;
pub use rolling::MetricsRegistry;
pub use rule_stats::{RuleContribution, RuleStats};
pub use run_record::{CycleStatus, Phase, PhaseRecord, RunRecord, StatusCounts};
