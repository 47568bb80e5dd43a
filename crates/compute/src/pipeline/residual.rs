//! Background removal for rescaled buffer snapshots.
//!
//! Two strategies, fixed for the lifetime of a run:
//! - [`ResidualExtractor::Recomputed`] decomposes the whole snapshot on every
//!   call and keeps the trailing `L` residual values.
//! - [`ResidualExtractor::Precomputed`] subtracts a tiled, precomputed pattern.

use std::sync::Arc;

use andeped_core::{AndepedError, Mode, Result};

use crate::algorithms::Decomposer;

/// One period of recurring structure, computed once before streaming.
#[derive(Debug, Clone, PartialEq)]
pub struct ModePattern {
    values: Vec<f64>,
}

impl ModePattern {
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(AndepedError::DegenerateDecomposition(
                "mode pattern is empty".into(),
            ));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(AndepedError::DegenerateDecomposition(format!(
                "mode pattern contains non-finite value {bad}"
            )));
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Repeat the pattern end to end and cut it to exactly `length` values.
    pub fn tile(&self, length: usize) -> Vec<f64> {
        self.values.iter().copied().cycle().take(length).collect()
    }
}

/// Mode-dependent residual extraction.
#[derive(Clone)]
pub enum ResidualExtractor {
    Recomputed {
        decomposer: Arc<dyn Decomposer>,
        alpha: f64,
        mode_count: usize,
        length_budget: usize,
    },
    Precomputed { pattern: ModePattern },
}

impl std::fmt::Debug for ResidualExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResidualExtractor::Recomputed { alpha, mode_count, length_budget, .. } => f
                .debug_struct("Recomputed")
                .field("alpha", alpha)
                .field("mode_count", mode_count)
                .field("length_budget", length_budget)
                .finish_non_exhaustive(),
            ResidualExtractor::Precomputed { pattern } => f
                .debug_struct("Precomputed")
                .field("pattern_len", &pattern.len())
                .finish(),
        }
    }
}

impl ResidualExtractor {
    pub fn mode(&self) -> Mode {
        match self {
            ResidualExtractor::Recomputed { .. } => Mode::Recomputed,
            ResidualExtractor::Precomputed { .. } => Mode::Precomputed,
        }
    }

    /// Residual of a rescaled snapshot. Recomputed mode returns at most the
    /// trailing `length_budget` values; precomputed mode returns one value per
    /// snapshot sample.
    pub fn extract(&self, rescaled: &[f64]) -> Result<Vec<f64>> {
        match self {
            ResidualExtractor::Recomputed {
                decomposer,
                alpha,
                mode_count,
                length_budget,
            } => {
                let decomposition = decomposer.decompose(rescaled, *alpha, *mode_count)?;
                if decomposition.residual.len() != rescaled.len() {
                    return Err(AndepedError::DegenerateDecomposition(format!(
                        "residual has {} values for {} inputs",
                        decomposition.residual.len(),
                        rescaled.len()
                    )));
                }
                let start = decomposition.residual.len().saturating_sub(*length_budget);
                Ok(decomposition.residual[start..].to_vec())
            }
            ResidualExtractor::Precomputed { pattern } => Ok(rescaled
                .iter()
                .zip(pattern.tile(rescaled.len()))
                .map(|(v, bg)| v - bg)
                .collect()),
        }
    }
}
