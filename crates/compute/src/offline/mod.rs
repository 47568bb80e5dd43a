//! Offline preparation: everything that happens before the first streamed value.
//!
//! Offline data is rescaled the same way the stream will be, decomposed for a
//! set of candidate `(alpha, k)` pairs, and the winner is turned into either
//! a decomposition horizon (mode I) or a precomputed mode pattern (mode II).

pub mod search;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use andeped_core::{AndepedError, Result, RunParameters};

use crate::algorithms::{Decomposer, Decomposition};
use crate::pipeline::{rescale, ModePattern, ScaleRange};

pub use search::{Candidate, Direction, ParameterSpace, RandomSearch, SearchOutcome, Trial};

/// Range and length of the offline series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataSummary {
    pub min: f64,
    pub max: f64,
    pub len: usize,
}

impl DataSummary {
    pub fn of(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(AndepedError::InvalidParameter("offline data is empty".into()));
        }
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in values {
            if !v.is_finite() {
                return Err(AndepedError::InvalidParameter(
                    "offline data contains a non-finite value".into(),
                ));
            }
            min = min.min(v);
            max = max.max(v);
        }
        Ok(Self {
            min,
            max,
            len: values.len(),
        })
    }
}

fn lowest_frequency(center_frequencies: &[f64]) -> Result<f64> {
    let lowest = center_frequencies
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min);
    if !(lowest > 0.0) || !lowest.is_finite() {
        return Err(AndepedError::ZeroFrequency(format!(
            "lowest centre frequency is {lowest}"
        )));
    }
    Ok(lowest)
}

/// Buffer length for recomputed mode.
///
/// The first mode tracks the trend and is ignored; the buffer must hold two
/// periods of the slowest remaining mode. With fewer than two modes there is
/// nothing to measure and twice the offline length is used. A horizon longer
/// than twice the offline length is rejected.
pub fn decomposition_horizon(center_frequencies: &[f64], offline_len: usize) -> Result<usize> {
    let limit = offline_len.saturating_mul(2);
    if center_frequencies.len() < 2 {
        return Ok(limit);
    }
    let lowest = lowest_frequency(&center_frequencies[1..])?;
    let horizon = (2.0 / lowest).ceil();
    if horizon > limit as f64 {
        return Err(AndepedError::InvalidParameter(format!(
            "decomposition horizon {horizon} exceeds twice the offline length ({limit})"
        )));
    }
    Ok(horizon as usize)
}

/// Period, in samples, of the slowest non-trend mode. `None` with fewer than two modes.
pub fn largest_period(center_frequencies: &[f64]) -> Result<Option<usize>> {
    if center_frequencies.len() < 2 {
        return Ok(None);
    }
    let lowest = lowest_frequency(&center_frequencies[1..])?;
    Ok(Some((1.0 / lowest).ceil() as usize))
}

/// Drop the incomplete trailing period so tiling the pattern does not introduce a seam.
///
/// Patterns shorter than one period are returned unchanged.
pub fn truncate_pattern(pattern: &ModePattern, center_frequencies: &[f64]) -> Result<ModePattern> {
    let len = pattern.len();
    let period = match largest_period(center_frequencies)? {
        Some(p) if p >= 1 && p <= len => p,
        _ => return Ok(pattern.clone()),
    };
    let keep = len - len % period;
    ModePattern::new(pattern.values()[..keep].to_vec())
}

/// Mean of squared residuals; 0 for an empty slice.
pub fn reconstruction_mse(residual: &[f64]) -> f64 {
    if residual.is_empty() {
        return 0.0;
    }
    residual.iter().map(|r| r * r).sum::<f64>() / residual.len() as f64
}

/// Rescale the offline series to `range` and decompose it.
pub fn decompose_offline(
    offline: &[f64],
    range: ScaleRange,
    decomposer: &dyn Decomposer,
    candidate: &Candidate,
) -> Result<Decomposition> {
    let rescaled = rescale(offline, range);
    decomposer.decompose(&rescaled, candidate.alpha, candidate.k)
}

/// What offline preparation hands to the streaming controller.
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub params: RunParameters,
    pub candidate: Candidate,
    pub center_frequencies: Vec<f64>,
    /// Objective value of the winning trial.
    pub objective: f64,
    /// Only set for precomputed mode.
    pub pattern: Option<ModePattern>,
}

/// Parameters for recomputed mode from an already chosen candidate.
pub fn recomputed_parameters(
    summary: &DataSummary,
    length_budget: usize,
    candidate: Candidate,
    center_frequencies: &[f64],
) -> Result<RunParameters> {
    let horizon = decomposition_horizon(center_frequencies, summary.len)?;
    if horizon < length_budget {
        warn!(
            horizon,
            length_budget, "decomposition horizon is shorter than the length budget"
        );
    }
    Ok(RunParameters {
        length_budget,
        alpha: candidate.alpha,
        mode_count: candidate.k,
        decomposition_horizon: horizon,
        mode_pattern_reference: None,
        input_min: summary.min,
        input_max: summary.max,
    })
}

/// Mode II preparation: choose the candidate whose background best explains
/// the offline data and keep its component sum as the pattern.
pub fn prepare_precomputed(
    offline: &[f64],
    length_budget: usize,
    range: ScaleRange,
    decomposer: &dyn Decomposer,
    search: &RandomSearch,
    space: &ParameterSpace,
    truncate: bool,
) -> Result<PreparedRun> {
    let summary = DataSummary::of(offline)?;
    let outcome = search.run(space, |candidate| {
        let decomposition = decompose_offline(offline, range, decomposer, candidate)?;
        Ok((reconstruction_mse(&decomposition.residual), decomposition))
    })?;

    let best = outcome.best;
    let decomposition = best.artefact;
    let mut pattern = ModePattern::new(decomposition.component_sum)?;
    if truncate {
        pattern = truncate_pattern(&pattern, &decomposition.center_frequencies)?;
    }
    // Informational only in precomputed mode.
    let horizon = decomposition_horizon(&decomposition.center_frequencies, summary.len)
        .unwrap_or(summary.len.saturating_mul(2));
    info!(
        alpha = best.candidate.alpha,
        k = best.candidate.k,
        mse = best.objective,
        pattern_len = pattern.len(),
        "mode pattern prepared"
    );

    Ok(PreparedRun {
        params: RunParameters {
            length_budget,
            alpha: best.candidate.alpha,
            mode_count: best.candidate.k,
            decomposition_horizon: horizon,
            mode_pattern_reference: None,
            input_min: summary.min,
            input_max: summary.max,
        },
        candidate: best.candidate,
        center_frequencies: decomposition.center_frequencies,
        objective: best.objective,
        pattern: Some(pattern),
    })
}

#[derive(Debug, Serialize, Deserialize)]
struct PatternRow {
    index: usize,
    value: f64,
}

#[derive(Debug, Deserialize)]
struct PatternValue {
    value: f64,
}

fn csv_err(e: csv::Error) -> AndepedError {
    AndepedError::Csv(e.to_string())
}

/// Write a pattern as `index,value` rows.
pub fn export_pattern(pattern: &ModePattern, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
    for (index, &value) in pattern.values().iter().enumerate() {
        wtr.serialize(PatternRow { index, value }).map_err(csv_err)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read a pattern from any CSV with a `value` column.
pub fn import_pattern(path: &Path) -> Result<ModePattern> {
    let mut rdr = csv::Reader::from_path(path).map_err(csv_err)?;
    let values = rdr
        .deserialize()
        .map(|row| row.map(|r: PatternValue| r.value))
        .collect::<std::result::Result<Vec<f64>, _>>()
        .map_err(csv_err)?;
    ModePattern::new(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_of_series() {
        let s = DataSummary::of(&[3.0, -1.0, 7.5]).unwrap();
        assert_eq!((s.min, s.max, s.len), (-1.0, 7.5, 3));
        assert!(DataSummary::of(&[]).is_err());
        assert!(DataSummary::of(&[1.0, f64::NAN]).is_err());
    }

    #[test]
    fn horizon_ignores_trend_mode() {
        // Trend mode at 0 does not count; slowest remaining is 0.05 -> 40 samples.
        assert_eq!(decomposition_horizon(&[0.0, 0.1, 0.05], 500).unwrap(), 40);
        assert_eq!(decomposition_horizon(&[0.0, 0.3], 500).unwrap(), 7);
    }

    #[test]
    fn horizon_with_single_mode_doubles_length() {
        assert_eq!(decomposition_horizon(&[0.01], 120).unwrap(), 240);
        assert_eq!(decomposition_horizon(&[], 10).unwrap(), 20);
    }

    #[test]
    fn horizon_longer_than_data_rejected() {
        // Near-DC second mode: 2e12 samples for a 1000-sample series.
        let err = decomposition_horizon(&[0.0, 1e-12], 1000).unwrap_err();
        assert!(matches!(err, AndepedError::InvalidParameter(_)));
        assert_eq!(decomposition_horizon(&[0.0, 0.001], 1000).unwrap(), 2000);

        let summary = DataSummary::of(&vec![1.0; 1000]).unwrap();
        assert!(recomputed_parameters(&summary, 50, Candidate { alpha: 10.0, k: 2 }, &[0.0, 1e-12])
            .is_err());
    }

    #[test]
    fn horizon_zero_frequency() {
        let err = decomposition_horizon(&[0.0, 0.0, 0.2], 100).unwrap_err();
        assert!(matches!(err, AndepedError::ZeroFrequency(_)));
    }

    #[test]
    fn truncation_keeps_whole_periods() {
        let pattern = ModePattern::new((0..10).map(f64::from).collect()).unwrap();
        // Period 4: 10 % 4 = 2 values dropped from the end.
        let cut = truncate_pattern(&pattern, &[0.0, 0.5, 0.25]).unwrap();
        assert_eq!(cut.values(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn truncation_skips_long_periods() {
        let pattern = ModePattern::new(vec![1.0; 5]).unwrap();
        let same = truncate_pattern(&pattern, &[0.0, 0.1]).unwrap();
        assert_eq!(same.len(), 5);
        // A single mode has no period to cut to.
        assert_eq!(truncate_pattern(&pattern, &[0.5]).unwrap().len(), 5);
    }

    #[test]
    fn truncation_zero_frequency() {
        let pattern = ModePattern::new(vec![1.0; 5]).unwrap();
        assert!(matches!(
            truncate_pattern(&pattern, &[0.3, 0.0]),
            Err(AndepedError::ZeroFrequency(_))
        ));
    }

    #[test]
    fn mse() {
        assert_eq!(reconstruction_mse(&[]), 0.0);
        assert!((reconstruction_mse(&[1.0, -1.0, 2.0]) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn recomputed_parameters_from_candidate() {
        let mut offline = vec![0.0; 60];
        offline[7] = 4.0;
        let summary = DataSummary::of(&offline).unwrap();
        let params = recomputed_parameters(
            &summary,
            50,
            Candidate { alpha: 900.0, k: 3 },
            &[0.0, 0.02, 0.1],
        )
        .unwrap();
        assert_eq!(params.decomposition_horizon, 100);
        assert_eq!(params.mode_count, 3);
        assert_eq!(params.input_max, 4.0);
    }

    #[test]
    fn pattern_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modesums").join("series.csv");
        let pattern = ModePattern::new(vec![0.5, -0.25, 0.0]).unwrap();
        export_pattern(&pattern, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("index,value\n"));
        assert_eq!(import_pattern(&path).unwrap(), pattern);
    }
}
