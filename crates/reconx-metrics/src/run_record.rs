//! Per-cycle metrics record (§3 `RunRecord`, §4.9).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::histogram::ConfidenceHistogram;
use crate::rule_stats::RuleStats;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleStatus {
    Success,
    CompletedWithErrors,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    FetchEmails,
    PollTransactions,
    Match,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::FetchEmails => "fetch_emails",
            Phase::PollTransactions => "poll_transactions",
            Phase::Match => "match",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub phase: Phase,
    pub duration_millis: i64,
    pub error: Option<String>,
}

impl PhaseRecord {
    pub fn ok(phase: Phase, duration_millis: i64) -> Self {
        Self {
            phase,
            duration_millis,
            error: None,
        }
    }

    pub fn failed(phase: Phase, duration_millis: i64, error: impl Into<String>) -> Self {
        Self {
            phase,
            duration_millis,
            error: Some(error.into()),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub auto_matched: u64,
    pub needs_review: u64,
    pub rejected: u64,
    pub no_candidates: u64,
}

impl StatusCounts {
    pub fn total(&self) -> u64 {
        self.auto_matched + self.needs_review + self.rejected + self.no_candidates
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunRecord {
    pub cycle_id: uuid::Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub status: CycleStatus,
    pub phases: Vec<PhaseRecord>,

    pub emails_fetched: u64,
    pub emails_new: u64,
    pub transactions_fetched: u64,
    pub transactions_new: u64,
    pub emails_matched: u64,

    pub status_counts: StatusCounts,
    pub avg_confidence: f64,
    pub min_confidence: f64,
    pub max_confidence: f64,
    pub confidence_histogram: ConfidenceHistogram,
    pub rule_stats: RuleStats,
}

impl RunRecord {
    pub fn duration_millis(&self) -> i64 {
        (self.ended_at - self.started_at).num_milliseconds()
    }

    pub fn phase_duration(&self, phase: Phase) -> Option<i64> {
        self.phases.iter().find(|p| p.phase == phase).map(|p| p.duration_millis)
    }
}
