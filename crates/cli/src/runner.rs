//! Parallel benchmark runs and the JSON summary they produce.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{error, info, warn};

use andeped_compute::{
    Decomposer, DetectorAdapter, DetectorKind, DetectorOptions, RunContext, StreamMetrics,
    StreamingController, Vmd,
};
use andeped_core::{HarnessConfig, Mode, RunParameters};
use andeped_scoring::Evaluation;

use crate::cli::RunArgs;
use crate::data::{discover_datasets, DataSeries, DatasetFiles};
use crate::prepare::{prepare, scale_range};
use crate::score::ScoringContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Failed,
}

/// Result of one (algorithm, dataset) run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub algorithm: String,
    pub dataset: String,
    pub status: RunStatus,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<RunParameters>,
    /// Offline search objective: F1 in mode I, reconstruction MSE in mode II.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<StreamMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<Evaluation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunOutcome {
    fn failed(algorithm: &str, dataset: &str, duration_ms: u64, err: &anyhow::Error) -> Self {
        Self {
            algorithm: algorithm.to_string(),
            dataset: dataset.to_string(),
            status: RunStatus::Failed,
            duration_ms,
            params: None,
            objective: None,
            record_path: None,
            stream: None,
            evaluation: None,
            error: Some(format!("{err:#}")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub test_id: String,
    pub profile: String,
    pub mode: Mode,
    pub generated_at: String,
    pub completed: usize,
    pub failed: usize,
    pub runs: Vec<RunOutcome>,
}

/// Shared, read-only inputs of every run.
struct RunShared<'a> {
    config: &'a HarnessConfig,
    decomposer: Arc<Vmd>,
    scoring: ScoringContext,
}

pub fn record_path(config: &HarnessConfig, algorithm: &str, dataset: &str) -> PathBuf {
    config.paths.results_dir.join(format!(
        "online_results_{}_{}_{}.csv",
        config.test_id, algorithm, dataset
    ))
}

pub fn summary_path(config: &HarnessConfig) -> PathBuf {
    config
        .paths
        .results_dir
        .join(format!("run_summary_{}.json", config.test_id))
}

fn resolve_algorithms(config: &HarnessConfig, requested: &[String]) -> Result<Vec<DetectorKind>> {
    let names = if requested.is_empty() {
        &config.algorithms
    } else {
        requested
    };
    if names.is_empty() {
        anyhow::bail!("no algorithms selected");
    }
    names
        .iter()
        .map(|n| n.parse::<DetectorKind>().map_err(anyhow::Error::from))
        .collect()
}

/// `andeped run`: every selected algorithm against every discovered dataset.
pub fn run_all(config: &HarnessConfig, args: &RunArgs) -> Result<RunSummary> {
    let algorithms = resolve_algorithms(config, &args.algorithms)?;
    let datasets = discover_datasets(&config.paths.offline_dir, &config.paths.online_dir, &args.datasets)?;
    if datasets.is_empty() {
        warn!(dir = %config.paths.offline_dir.display(), "no datasets found");
    }

    let shared = RunShared {
        config,
        decomposer: Arc::new(Vmd::from_config(&config.decomposition)),
        scoring: ScoringContext::from_config(config)?,
    };

    let jobs: Vec<(DetectorKind, &DatasetFiles)> = algorithms
        .iter()
        .flat_map(|&kind| datasets.iter().map(move |d| (kind, d)))
        .collect();

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = args.jobs {
        builder = builder.num_threads(n);
    }
    let pool = builder.build().context("failed to build worker pool")?;
    info!(
        runs = jobs.len(),
        threads = pool.current_num_threads(),
        mode = %config.stream.mode,
        "benchmark starting"
    );

    let runs: Vec<RunOutcome> = pool.install(|| {
        jobs.par_iter()
            .map(|(kind, files)| {
                let started = Instant::now();
                match run_one(&shared, *kind, files) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!(algorithm = kind.as_str(), dataset = %files.name, error = %format!("{e:#}"), "run failed");
                        RunOutcome::failed(
                            kind.as_str(),
                            &files.name,
                            started.elapsed().as_millis() as u64,
                            &e,
                        )
                    }
                }
            })
            .collect()
    });

    let failed = runs.iter().filter(|r| r.status == RunStatus::Failed).count();
    let summary = RunSummary {
        test_id: config.test_id.clone(),
        profile: config.profile_label().to_string(),
        mode: config.stream.mode,
        generated_at: chrono::Utc::now().to_rfc3339(),
        completed: runs.len() - failed,
        failed,
        runs,
    };
    write_summary(&summary, &summary_path(config))?;
    info!(completed = summary.completed, failed = summary.failed, "benchmark finished");
    Ok(summary)
}

fn run_one(shared: &RunShared<'_>, kind: DetectorKind, files: &DatasetFiles) -> Result<RunOutcome> {
    let config = shared.config;
    let started = Instant::now();
    let offline = DataSeries::read(&files.offline)?;
    let online = DataSeries::read(&files.online)?;
    if online.is_empty() {
        warn!(dataset = %files.name, "online series is empty");
    }

    let prepared = prepare(
        config,
        kind,
        &files.name,
        &offline,
        &online,
        &shared.decomposer,
        &shared.scoring,
    )?;

    let detector = DetectorAdapter::from_kind(
        kind,
        DetectorOptions {
            input_min: prepared.params.input_min,
            input_max: prepared.params.input_max,
        },
    );
    let decomposer: Arc<dyn Decomposer> = shared.decomposer.clone();
    let mut controller = StreamingController::from_parameters(
        RunContext::new(kind.as_str(), files.name.as_str()),
        config.stream.mode,
        &prepared.params,
        scale_range(config),
        decomposer,
        prepared.pattern.clone(),
        detector,
    )?;
    controller.warm_up(&offline.values);
    controller
        .run(online.values.iter().copied())
        .with_context(|| format!("streaming failed for {} / {}", kind, files.name))?;

    let stream = controller.metrics().clone();
    let record = controller.into_record();
    let path = record_path(config, kind.as_str(), &files.name);
    record
        .export_csv(&path)
        .with_context(|| format!("failed to write {}", path.display()))?;

    // Labels are resolved against the whole dataset; only the online part is scored.
    let evaluation = if shared.scoring.has_labels() {
        let timestamps: Vec<String> = offline
            .timestamps
            .iter()
            .chain(&online.timestamps)
            .cloned()
            .collect();
        let scored = offline.len()..timestamps.len();
        let evaluation = shared
            .scoring
            .evaluate(&files.name, kind.as_str(), &timestamps, scored, &record.scores())
            .with_context(|| {
                format!(
                    "scoring failed for {} / {}, record kept at {}",
                    kind,
                    files.name,
                    path.display()
                )
            })?;
        Some(evaluation)
    } else {
        None
    };

    Ok(RunOutcome {
        algorithm: kind.as_str().to_string(),
        dataset: files.name.clone(),
        status: RunStatus::Completed,
        duration_ms: started.elapsed().as_millis() as u64,
        params: Some(prepared.params),
        objective: Some(prepared.objective),
        record_path: Some(path.display().to_string()),
        stream: Some(stream),
        evaluation,
        error: None,
    })
}

fn write_summary(summary: &RunSummary, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
