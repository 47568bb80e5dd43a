use serde::{Deserialize, Serialize};

use crate::confusion::ConfusionCounts;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl Metrics {
    /// Zero denominators give zero, nothing else is smoothed.
    pub fn from_counts(counts: &ConfusionCounts) -> Self {
        let tp = counts.true_positives as f64;
        let fp = counts.false_positives;
        let fn_ = counts.false_negatives as f64;

        let precision = if tp + fp != 0.0 { tp / (tp + fp) } else { 0.0 };
        let recall = if tp + fn_ != 0.0 { tp / (tp + fn_) } else { 0.0 };
        let f1 = if precision + recall != 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self { precision, recall, f1 }
    }
}
