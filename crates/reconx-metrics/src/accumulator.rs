//! Single-writer-per-cycle accumulator (§5 "Metrics accumulator: single
//! writer per cycle"). The orchestrator creates one per cycle, records
//! phase outcomes and per-email match decisions as Phase 3 runs, then
//! finalizes it into an immutable [`RunRecord`].

use chrono::{DateTime, Utc};
use reconx_core::model::{MatchResult, MatchStatus, RuleScore};
use uuid::Uuid;

use crate::histogram::ConfidenceHistogram;
use crate::rule_stats::RuleStats;
use crate::run_record::{Phase, PhaseRecord, RunRecord, StatusCounts};

pub struct CycleAccumulator {
    cycle_id: Uuid,
    started_at: DateTime<Utc>,
    phases: Vec<PhaseRecord>,

    emails_fetched: u64,
    emails_new: u64,
    transactions_fetched: u64,
    transactions_new: u64,
    emails_matched: u64,

    status_counts: StatusCounts,
    confidence_sum: f64,
    confidence_count: u64,
    min_confidence: f64,
    max_confidence: f64,
    confidence_histogram: ConfidenceHistogram,
    rule_stats: RuleStats,
}

impl CycleAccumulator {
    pub fn start() -> Self {
        Self {
            cycle_id: Uuid::new_v4(),
            started_at: Utc::now(),
            phases: Vec::new(),
            emails_fetched: 0,
            emails_new: 0,
            transactions_fetched: 0,
            transactions_new: 0,
            emails_matched: 0,
            status_counts: StatusCounts::default(),
            confidence_sum: 0.0,
            confidence_count: 0,
            min_confidence: 1.0,
            max_confidence: 0.0,
            confidence_histogram: ConfidenceHistogram::default(),
            rule_stats: RuleStats::default(),
        }
    }

    pub fn record_phase(&mut self, record: PhaseRecord) {
        self.phases.push(record);
    }

    pub fn record_email_fetch(&mut self, fetched: u64, new: u64) {
        self.emails_fetched += fetched;
        self.emails_new += new;
    }

    pub fn record_transaction_fetch(&mut self, fetched: u64, new: u64) {
        self.transactions_fetched += fetched;
        self.transactions_new += new;
    }

    /// Records one email's match decision and every candidate's rule
    /// scores (so rule contribution stats cover the full candidate set,
    /// not just the winner).
    pub fn record_match(&mut self, result: &MatchResult, all_scores: &[Vec<RuleScore>]) {
        self.emails_matched += 1;

        match result.status {
            MatchStatus::AutoMatched => self.status_counts.auto_matched += 1,
            MatchStatus::NeedsReview => self.status_counts.needs_review += 1,
            MatchStatus::Rejected => self.status_counts.rejected += 1,
            MatchStatus::NoCandidates => self.status_counts.no_candidates += 1,
            MatchStatus::Pending => {}
        }

        if result.best_candidate.is_some() {
            self.confidence_sum += result.confidence;
            self.confidence_count += 1;
            self.min_confidence = self.min_confidence.min(result.confidence);
            self.max_confidence = self.max_confidence.max(result.confidence);
            self.confidence_histogram.record(result.confidence);
        }

        for scores in all_scores {
            self.rule_stats.record_scores(scores);
        }
    }

    pub fn finalize(self) -> RunRecord {
        let status = if self.phases.iter().any(|p| !p.succeeded()) {
            if self.phases.iter().all(|p| !p.succeeded()) {
                crate::run_record::CycleStatus::Failed
            } else {
                crate::run_record::CycleStatus::CompletedWithErrors
            }
        } else {
            crate::run_record::CycleStatus::Success
        };

        let avg_confidence = if self.confidence_count > 0 {
            self.confidence_sum / self.confidence_count as f64
        } else {
            0.0
        };

        RunRecord {
            cycle_id: self.cycle_id,
            started_at: self.started_at,
            ended_at: Utc::now(),
            status,
            phases: self.phases,
            emails_fetched: self.emails_fetched,
            emails_new: self.emails_new,
            transactions_fetched: self.transactions_fetched,
            transactions_new: self.transactions_new,
            emails_matched: self.emails_matched,
            status_counts: self.status_counts,
            avg_confidence,
            min_confidence: if self.confidence_count > 0 { self.min_confidence } else { 0.0 },
            max_confidence: self.max_confidence,
            confidence_histogram: self.confidence_histogram,
            rule_stats: self.rule_stats,
        }
    }

    pub fn phase(&self, phase: Phase) -> Option<&PhaseRecord> {
        self.phases.iter().find(|p| p.phase == phase)
    }
}
