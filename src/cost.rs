//! Asymmetric cost scoring for evaluation runs
//!
//! A wrong match costs more than abstaining: merging two different companies is
//! harder to undo than leaving a row for manual review.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::resolver::NO_MATCH;

pub const COST_CORRECT: u8 = 0;
pub const COST_ABSTAIN: u8 = 1;
pub const COST_WRONG: u8 = 5;

pub fn cost(true_identifier: i64, predicted_identifier: i64) -> u8 {
    if predicted_identifier == true_identifier {
        COST_CORRECT
    } else if predicted_identifier == NO_MATCH {
        COST_ABSTAIN
    } else {
        COST_WRONG
    }
}

/// Cost of one evaluated query row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CostRecord {
    pub row_index: i64,
    pub cost: u8,
}

/// Occurrence count per cost value for a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CostSummary {
    pub counts: BTreeMap<u8, usize>,
}

impl CostSummary {
    pub fn add(&mut self, cost: u8) {
        *self.counts.entry(cost).or_insert(0) += 1;
    }

    pub fn rows(&self) -> usize {
        self.counts.values().sum()
    }

    /// Sum of all row costs
    pub fn total(&self) -> u64 {
        self.counts
            .iter()
            .map(|(cost, n)| u64::from(*cost) * *n as u64)
            .sum()
    }

    /// Share of rows with cost 0; `0.0` for an empty run
    pub fn accuracy(&self) -> f64 {
        let rows = self.rows();
        if rows == 0 {
            return 0.0;
        }
        let correct = self.counts.get(&COST_CORRECT).copied().unwrap_or(0);
        correct as f64 / rows as f64
    }
}

impl FromIterator<(i64, i64)> for CostSummary {
    fn from_iter<I: IntoIterator<Item = (i64, i64)>>(pairs: I) -> Self {
        let mut summary = CostSummary::default();
        for (truth, predicted) in pairs {
            summary.add(cost(truth, predicted));
        }
        summary
    }
}

impl Extend<CostRecord> for CostSummary {
    fn extend<I: IntoIterator<Item = CostRecord>>(&mut self, records: I) {
        for record in records {
            self.add(record.cost);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_values() {
        assert_eq!(cost(5, 5), 0);
        assert_eq!(cost(5, -1), 1);
        assert_eq!(cost(5, 7), 5);
    }

    #[test]
    fn test_summary_counts() {
        let summary: CostSummary = [(1, 1), (2, 2), (3, -1), (4, 9), (5, 5)]
            .into_iter()
            .collect();
        assert_eq!(summary.counts.get(&0), Some(&3));
        assert_eq!(summary.counts.get(&1), Some(&1));
        assert_eq!(summary.counts.get(&5), Some(&1));
        assert_eq!(summary.rows(), 5);
        assert_eq!(summary.total(), 6);
        assert!((summary.accuracy() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_empty_summary() {
        let summary = CostSummary::default();
        assert_eq!(summary.total(), 0);
        assert_eq!(summary.accuracy(), 0.0);
        assert!(summary.counts.is_empty());
    }

    #[test]
    fn test_extend_with_records() {
        let mut summary = CostSummary::default();
        summary.extend([
            CostRecord { row_index: 0, cost: 0 },
            CostRecord { row_index: 1, cost: 5 },
        ]);
        assert_eq!(summary.total(), 5);
        assert_eq!(summary.rows(), 2);
    }
}
