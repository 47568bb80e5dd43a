//! Offline preparation per mode.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use andeped_compute::offline::{
    decompose_offline, export_pattern, prepare_precomputed, recomputed_parameters, DataSummary,
    Direction, ParameterSpace, PreparedRun, RandomSearch,
};
use andeped_compute::{DetectorAdapter, DetectorKind, DetectorOptions, ScaleRange, Vmd};
use andeped_core::{HarnessConfig, Mode};
use andeped_scoring::{binarize, evaluate};

use crate::data::DataSeries;
use crate::score::ScoringContext;

pub fn scale_range(config: &HarnessConfig) -> ScaleRange {
    ScaleRange {
        lo: config.stream.scale_min,
        hi: config.stream.scale_max,
    }
}

/// Where the winning pattern of a precomputed run is exported.
pub fn pattern_path(config: &HarnessConfig, algorithm: &str, dataset: &str) -> PathBuf {
    config
        .paths
        .pattern_dir
        .join(format!("usum_{}_{}_{}.csv", config.test_id, algorithm, dataset))
}

/// Choose run parameters for one (algorithm, dataset) pair from its offline series.
///
/// `online` is only read for its timestamps, so labels can be resolved
/// against the whole dataset.
pub fn prepare(
    config: &HarnessConfig,
    kind: DetectorKind,
    dataset: &str,
    offline: &DataSeries,
    online: &DataSeries,
    decomposer: &Vmd,
    scoring: &ScoringContext,
) -> Result<PreparedRun> {
    let space = ParameterSpace::from_config(&config.search);
    let range = scale_range(config);
    info!(
        algorithm = kind.as_str(),
        dataset,
        mode = %config.stream.mode,
        trials = config.search.trials,
        "offline preparation started"
    );

    match config.stream.mode {
        Mode::Precomputed => {
            let search = RandomSearch::new(config.search.trials, config.search.seed, Direction::Minimize);
            let mut prepared = prepare_precomputed(
                &offline.values,
                config.stream.length_budget,
                range,
                decomposer,
                &search,
                &space,
                config.stream.truncate_pattern,
            )
            .with_context(|| format!("offline preparation failed for {dataset}"))?;

            if let Some(pattern) = &prepared.pattern {
                let path = pattern_path(config, kind.as_str(), dataset);
                export_pattern(pattern, &path)
                    .with_context(|| format!("failed to export pattern to {}", path.display()))?;
                prepared.params.mode_pattern_reference = Some(path.display().to_string());
            }
            Ok(prepared)
        }
        Mode::Recomputed => {
            prepare_recomputed(config, kind, dataset, offline, online, decomposer, scoring)
        }
    }
}

/// Mode I: pick the candidate whose offline residual gives the detector its best F1.
fn prepare_recomputed(
    config: &HarnessConfig,
    kind: DetectorKind,
    dataset: &str,
    offline: &DataSeries,
    online: &DataSeries,
    decomposer: &Vmd,
    scoring: &ScoringContext,
) -> Result<PreparedRun> {
    let summary = DataSummary::of(&offline.values)?;
    let timestamps: Vec<String> = offline
        .timestamps
        .iter()
        .chain(&online.timestamps)
        .cloned()
        .collect();
    let flags = scoring
        .flags(dataset, &timestamps, 0..offline.len())
        .with_context(|| format!("mode I needs labelled offline data for {dataset}"))?;
    let threshold = scoring.threshold(kind.as_str())?;
    let space = ParameterSpace::from_config(&config.search);
    let range = scale_range(config);
    let options = *scoring.options();

    let search = RandomSearch::new(config.search.trials, config.search.seed, Direction::Maximize);
    let outcome = search
        .run(&space, |candidate| {
            let decomposition = decompose_offline(&offline.values, range, decomposer, candidate)?;
            let residual = DataSummary::of(&decomposition.residual)?;
            let mut detector = DetectorAdapter::from_kind(
                kind,
                DetectorOptions {
                    input_min: residual.min,
                    input_max: residual.max,
                },
            );
            detector.initialize()?;
            let scores = decomposition
                .residual
                .iter()
                .map(|&r| detector.feed(r))
                .collect::<andeped_core::Result<Vec<f64>>>()?;
            let evaluation = evaluate(&binarize(&scores, threshold), &flags, &options)?;
            Ok((evaluation.metrics.f1, decomposition.center_frequencies))
        })
        .with_context(|| format!("offline search failed for {dataset}"))?;

    let best = outcome.best;
    let params = recomputed_parameters(
        &summary,
        config.stream.length_budget,
        best.candidate,
        &best.artefact,
    )
    .with_context(|| format!("no usable decomposition horizon for {dataset}"))?;
    info!(
        alpha = best.candidate.alpha,
        k = best.candidate.k,
        f1 = best.objective,
        horizon = params.decomposition_horizon,
        "recomputed parameters chosen"
    );

    Ok(PreparedRun {
        params,
        candidate: best.candidate,
        center_frequencies: best.artefact,
        objective: best.objective,
        pattern: None,
    })
}
