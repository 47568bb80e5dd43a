use serde::{Deserialize, Serialize};

use andeped_core::{AndepedError, Result};

/// Windowed confusion matrix.
///
/// With normalization, false positives and true negatives are measured in
/// window-sized units and become fractional; true negatives can go negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub true_positives: u64,
    pub false_positives: f64,
    pub true_negatives: f64,
    pub false_negatives: u64,
}

impl ConfusionCounts {
    /// Scan `detections` against `windows` (both length `N`), skipping position 0.
    pub fn measure(
        detections: &[bool],
        windows: &[u32],
        window_size: usize,
        normalize: bool,
    ) -> Result<Self> {
        if detections.len() != windows.len() {
            return Err(AndepedError::LengthMismatch {
                expected: windows.len(),
                actual: detections.len(),
            });
        }

        let mut tp = 0u64;
        let mut fp = 0u64;
        let mut fn_ = 0u64;
        let mut last_detected = 0u32;

        for y in 1..detections.len() {
            let current = windows[y];
            let previous = windows[y - 1];

            if current == 0 {
                if previous > 0 && last_detected != previous {
                    fn_ += 1;
                }
                if detections[y] {
                    fp += 1;
                }
            } else {
                if previous != current && previous != 0 && last_detected != previous {
                    fn_ += 1;
                }
                if detections[y] && last_detected != current {
                    tp += 1;
                    last_detected = current;
                }
            }
        }

        let n = detections.len() as f64;
        let (false_positives, true_negatives) = if normalize {
            let unit = 2.0 * window_size as f64 + 1.0;
            let fp = fp as f64 / unit;
            (fp, n / unit - tp as f64 - fp - fn_ as f64)
        } else {
            let fp = fp as f64;
            (fp, n - tp as f64 - fp - fn_ as f64)
        };

        Ok(Self {
            true_positives: tp,
            false_positives,
            true_negatives,
            false_negatives: fn_,
        })
    }
}
