//! Per-rule contribution tracking (§4.9): invocations, raw-score
//! aggregates, and a count of "strong" contributions (raw ≥ 0.8).

use std::collections::BTreeMap;

use reconx_core::model::RuleScore;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleContribution {
    pub invocations: u64,
    pub total_raw: f64,
    pub min_raw: f64,
    pub max_raw: f64,
    pub strong_count: u64,
}

impl RuleContribution {
    fn record(&mut self, raw: f64) {
        if self.invocations == 0 {
            self.min_raw = raw;
            self.max_raw = raw;
        } else {
            self.min_raw = self.min_raw.min(raw);
            self.max_raw = self.max_raw.max(raw);
        }
        self.invocations += 1;
        self.total_raw += raw;
        if raw >= 0.8 {
            self.strong_count += 1;
        }
    }

    pub fn avg_raw(&self) -> f64 {
        if self.invocations == 0 {
            0.0
        } else {
            self.total_raw / self.invocations as f64
        }
    }
}

/// Accumulates [`RuleContribution`] per rule name across every
/// candidate scored in a cycle.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RuleStats {
    pub by_rule: BTreeMap<String, RuleContribution>,
}

impl RuleStats {
    pub fn record_scores(&mut self, scores: &[RuleScore]) {
        for score in scores {
            self.by_rule.entry(score.rule_name.clone()).or_default().record(score.raw);
        }
    }

    pub fn merge(&mut self, other: &RuleStats) {
        for (name, contribution) in &other.by_rule {
            let entry = self.by_rule.entry(name.clone()).or_default();
            if entry.invocations == 0 {
                *entry = *contribution;
                continue;
            }
            entry.min_raw = entry.min_raw.min(contribution.min_raw);
            entry.max_raw = entry.max_raw.max(contribution.max_raw);
            entry.total_raw += contribution.total_raw;
            entry.invocations += contribution.invocations;
            entry.strong_count += contribution.strong_count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn score(rule: &str, raw: f64) -> RuleScore {
        RuleScore {
            rule_name: rule.into(),
            raw,
            weight: 0.1,
            weighted: raw * 0.1,
            details: BTreeMap::new(),
        }
    }

    #[test]
    fn aggregates_min_max_avg_and_strong_count() {
        let mut stats = RuleStats::default();
        stats.record_scores(&[score("exact_amount", 1.0), score("exact_amount", 0.5)]);
        let contribution = &stats.by_rule["exact_amount"];
        assert_eq!(contribution.invocations, 2);
        assert_eq!(contribution.min_raw, 0.5);
        assert_eq!(contribution.max_raw, 1.0);
        assert_eq!(contribution.avg_raw(), 0.75);
        assert_eq!(contribution.strong_count, 1);
    }
}
