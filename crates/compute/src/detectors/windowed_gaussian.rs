use andeped_core::Result;

use super::{Detector, DetectorOptions};

const WINDOW_SIZE: usize = 6400;
const STEP_SIZE: usize = 100;
const MIN_STD: f64 = 0.000001;

/// Scores each value by how far into the tail of a Gaussian fitted over a
/// sliding window of previous values it falls.
///
/// The window fills one value at a time, then slides forward in blocks of
/// `step_size` values. Score is `1 - Q(x)` with `Q` the two-sided folded tail.
#[derive(Debug, Clone)]
pub struct WindowedGaussianDetector {
    window_size: usize,
    step_size: usize,
    window: Vec<f64>,
    step_buffer: Vec<f64>,
    mean: f64,
    std: f64,
}

impl WindowedGaussianDetector {
    pub fn new(_options: DetectorOptions) -> Self {
        Self::with_window(WINDOW_SIZE, STEP_SIZE)
    }

    pub fn with_window(window_size: usize, step_size: usize) -> Self {
        Self {
            window_size: window_size.max(1),
            step_size: step_size.max(1),
            window: Vec::new(),
            step_buffer: Vec::new(),
            mean: 0.0,
            std: 1.0,
        }
    }

    fn update_window(&mut self) {
        let n = self.window.len() as f64;
        self.mean = self.window.iter().sum::<f64>() / n;
        let variance = self.window.iter().map(|v| (v - self.mean).powi(2)).sum::<f64>() / n;
        self.std = variance.sqrt();
        if self.std == 0.0 {
            self.std = MIN_STD;
        }
    }
}

/// Probability of a sample lying further from `mean` than `x`, on the same side.
fn tail_probability(x: f64, mean: f64, std: f64) -> f64 {
    let x = if x < mean { 2.0 * mean - x } else { x };
    let z = (x - mean) / std;
    0.5 * libm::erfc(z / std::f64::consts::SQRT_2)
}

impl Detector for WindowedGaussianDetector {
    fn name(&self) -> &str {
        "windowedGaussian"
    }

    fn score(&mut self, value: f64) -> Result<f64> {
        let score = if self.window.is_empty() {
            0.0
        } else {
            1.0 - tail_probability(value, self.mean, self.std)
        };

        if self.window.len() < self.window_size {
            self.window.push(value);
            self.update_window();
        } else {
            self.step_buffer.push(value);
            if self.step_buffer.len() == self.step_size {
                self.window.drain(..self.step_size);
                self.window.append(&mut self.step_buffer);
                self.update_window();
            }
        }

        Ok(score)
    }
}
