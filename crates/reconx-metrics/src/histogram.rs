//! Confidence histogram with the five fixed buckets from §4.9.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceHistogram {
    /// [0.90, 1.0]
    pub at_least_90: u64,
    /// [0.80, 0.90)
    pub from_80_to_90: u64,
    /// [0.60, 0.80)
    pub from_60_to_80: u64,
    /// [0.40, 0.60)
    pub from_40_to_60: u64,
    /// < 0.40
    pub below_40: u64,
}

impl ConfidenceHistogram {
    pub fn record(&mut self, confidence: f64) {
        if confidence >= 0.90 {
            self.at_least_90 += 1;
        } else if confidence >= 0.80 {
            self.from_80_to_90 += 1;
        } else if confidence >= 0.60 {
            self.from_60_to_80 += 1;
        } else if confidence >= 0.40 {
            self.from_40_to_60 += 1;
        } else {
            self.below_40 += 1;
        }
    }

    pub fn total(&self) -> u64 {
        self.at_least_90 + self.from_80_to_90 + self.from_60_to_80 + self.from_40_to_60 + self.below_40
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_values_map_to_higher_bucket() {
        let mut h = ConfidenceHistogram::default();
        h.record(0.90);
        h.record(0.80);
        h.record(0.60);
        h.record(0.40);
        h.record(0.39);
        assert_eq!(h.at_least_90, 1);
        assert_eq!(h.from_80_to_90, 1);
        assert_eq!(h.from_60_to_80, 1);
        assert_eq!(h.from_40_to_60, 1);
        assert_eq!(h.below_40, 1);
        assert_eq!(h.total(), 5);
    }
}
