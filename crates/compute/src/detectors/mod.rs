//! Pluggable anomaly detectors.
//!
//! The pipeline only sees the [`Detector`] capability. [`DetectorAdapter`]
//! enforces the contract around it (initialize before use, scores in `[0, 1]`).
//!
//! Reference implementations:
//! - [`windowed_gaussian`]: Gaussian tail probability over a sliding window
//! - [`bayes_changept`]: Bayesian online changepoint detection
//! - [`random`]: seeded uniform scores, a lower bound for benchmarks

pub mod bayes_changept;
pub mod random;
pub mod windowed_gaussian;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use andeped_core::{AndepedError, Result};

pub use bayes_changept::BayesChangePtDetector;
pub use random::RandomDetector;
pub use windowed_gaussian::WindowedGaussianDetector;

/// Construction parameters shared by every detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorOptions {
    pub input_min: f64,
    pub input_max: f64,
}

/// A streaming anomaly detector.
///
/// Each instance owns all of its state; independent runs never share one.
pub trait Detector: Send {
    fn name(&self) -> &str;

    /// Prepare internal state. Called once before the first `score`.
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Consume one value and return its anomaly score, expected in `[0, 1]`.
    fn score(&mut self, value: f64) -> Result<f64>;
}

/// Known detector implementations, keyed by their benchmark names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectorKind {
    #[serde(rename = "windowedGaussian")]
    WindowedGaussian,
    #[serde(rename = "bayesChangePt")]
    BayesChangePt,
    #[serde(rename = "random")]
    Random,
}

impl DetectorKind {
    pub const ALL: [DetectorKind; 3] = [
        DetectorKind::WindowedGaussian,
        DetectorKind::BayesChangePt,
        DetectorKind::Random,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorKind::WindowedGaussian => "windowedGaussian",
            DetectorKind::BayesChangePt => "bayesChangePt",
            DetectorKind::Random => "random",
        }
    }

    pub fn build(&self, options: DetectorOptions) -> Box<dyn Detector> {
        match self {
            DetectorKind::WindowedGaussian => Box::new(WindowedGaussianDetector::new(options)),
            DetectorKind::BayesChangePt => Box::new(BayesChangePtDetector::new(options)),
            DetectorKind::Random => Box::new(RandomDetector::new(options)),
        }
    }
}

impl FromStr for DetectorKind {
    type Err = AndepedError;

    fn from_str(s: &str) -> Result<Self> {
        DetectorKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AndepedError::UnknownDetector(s.to_string()))
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contract-enforcing wrapper around a [`Detector`].
pub struct DetectorAdapter {
    inner: Box<dyn Detector>,
    initialized: bool,
    fed: u64,
}

impl DetectorAdapter {
    pub fn new(inner: Box<dyn Detector>) -> Self {
        Self {
            inner,
            initialized: false,
            fed: 0,
        }
    }

    pub fn from_kind(kind: DetectorKind, options: DetectorOptions) -> Self {
        Self::new(kind.build(options))
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Err(self.violation("initialize called twice"));
        }
        self.inner.initialize()?;
        self.initialized = true;
        debug!(detector = self.inner.name(), "detector initialized");
        Ok(())
    }

    /// Feed one value. Scores outside `[0, 1]` (or NaN) fail the run.
    pub fn feed(&mut self, value: f64) -> Result<f64> {
        if !self.initialized {
            return Err(self.violation("feed called before initialize"));
        }
        let score = self.inner.score(value)?;
        if !(0.0..=1.0).contains(&score) {
            return Err(self.violation(&format!(
                "score {score} at input #{} is outside [0, 1]",
                self.fed
            )));
        }
        self.fed += 1;
        Ok(score)
    }

    /// Number of values successfully scored.
    pub fn fed(&self) -> u64 {
        self.fed
    }

    fn violation(&self, reason: &str) -> AndepedError {
        AndepedError::PluginContractViolation {
            detector: self.inner.name().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Debug for DetectorAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectorAdapter")
            .field("detector", &self.inner.name())
            .field("initialized", &self.initialized)
            .field("fed", &self.fed)
            .finish()
    }
}
