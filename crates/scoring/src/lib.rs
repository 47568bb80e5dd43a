//! Windowed anomaly-detection scoring.
//!
//! Ground-truth anomalies are widened into numbered windows; a detection
//! inside a window is one true positive no matter how many follow it, a
//! detection outside every window is a false positive, and a window nobody
//! detected is a false negative.

pub mod confusion;
pub mod edges;
pub mod evaluate;
pub mod ground_truth;
pub mod metrics;
pub mod thresholds;
pub mod windows;

pub use confusion::ConfusionCounts;
pub use edges::rising_edges;
pub use evaluate::{evaluate, Evaluation, ScoringOptions};
pub use ground_truth::GroundTruth;
pub use metrics::Metrics;
pub use thresholds::{binarize, is_half_threshold, Thresholds};
pub use windows::{anomaly_window_size, build_windows, WindowSize};
