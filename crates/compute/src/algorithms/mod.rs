//! Numeric routines used by the streaming pipeline.
//!
//! - [`vmd`]: variational mode decomposition behind the [`Decomposer`] trait

pub mod vmd;

use andeped_core::Result;

pub use vmd::Vmd;

/// Output of an additive decomposition. Time indices are the vector positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    /// Input minus the summed background components.
    pub residual: Vec<f64>,
    /// Final centre frequency of every mode, in cycles per sample.
    pub center_frequencies: Vec<f64>,
    /// Sum of the background components, same length as the input.
    pub component_sum: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
}

/// Splits a signal into a background sum and a residual.
///
/// Implementations must be deterministic and free of shared mutable state so
/// independent runs can call them from different threads.
pub trait Decomposer: Send + Sync {
    fn decompose(&self, values: &[f64], alpha: f64, k: usize) -> Result<Decomposition>;
}
