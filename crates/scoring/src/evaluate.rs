use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use andeped_core::config::ScoringConfig;
use andeped_core::Result;

use crate::confusion::ConfusionCounts;
use crate::edges::rising_edges;
use crate::metrics::Metrics;
use crate::windows::{build_windows, WindowSize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringOptions {
    pub window_size: WindowSize,
    pub normalize: bool,
    pub rising_edge: bool,
}

impl Default for ScoringOptions {
    fn default() -> Self {
        Self {
            window_size: WindowSize::Nab,
            normalize: true,
            rising_edge: true,
        }
    }
}

impl ScoringOptions {
    pub fn from_config(config: &ScoringConfig) -> Self {
        Self {
            window_size: config
                .fixed_window_size
                .map_or(WindowSize::Nab, WindowSize::Fixed),
            normalize: config.normalize,
            rising_edge: config.rising_edge,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub window_size: usize,
    pub counts: ConfusionCounts,
    pub metrics: Metrics,
}

/// Score a binarized detection stream against ground-truth indices.
///
/// Pure function of its inputs: the same arguments always give the same result.
pub fn evaluate(detections: &[bool], flags: &[usize], options: &ScoringOptions) -> Result<Evaluation> {
    let len = detections.len();
    let window_size = options.window_size.resolve(len, flags.len());
    let windows = build_windows(flags, window_size, len);

    let filtered;
    let detections = if options.rising_edge {
        filtered = rising_edges(detections);
        &filtered[..]
    } else {
        detections
    };

    let counts = ConfusionCounts::measure(detections, &windows, window_size, options.normalize)?;
    if counts.true_negatives < 0.0 {
        warn!(
            true_negatives = counts.true_negatives,
            window_size, len, "negative true negative count"
        );
    }
    let metrics = Metrics::from_counts(&counts);
    debug!(
        window_size,
        tp = counts.true_positives,
        fp = counts.false_positives,
        fn_ = counts.false_negatives,
        f1 = metrics.f1,
        "evaluation finished"
    );

    Ok(Evaluation {
        window_size,
        counts,
        metrics,
    })
}
