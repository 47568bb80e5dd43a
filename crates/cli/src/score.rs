//! Labels, thresholds and scoring options shared by every run.

use std::ops::Range;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use andeped_compute::RunRecord;
use andeped_core::{AndepedError, HarnessConfig};
use andeped_scoring::{binarize, evaluate, Evaluation, GroundTruth, ScoringOptions, Thresholds};

use crate::cli::ScoreArgs;
use crate::data::DataSeries;

/// Loaded once, then read concurrently by every run.
#[derive(Debug, Clone)]
pub struct ScoringContext {
    labels: Option<GroundTruth>,
    thresholds: Thresholds,
    options: ScoringOptions,
}

impl ScoringContext {
    pub fn new(labels: Option<GroundTruth>, thresholds: Thresholds, options: ScoringOptions) -> Self {
        Self {
            labels,
            thresholds,
            options,
        }
    }

    pub fn from_config(config: &HarnessConfig) -> Result<Self> {
        let labels = match &config.paths.labels_file {
            Some(path) => Some(
                GroundTruth::load(path)
                    .with_context(|| format!("failed to load labels from {}", path.display()))?,
            ),
            None => None,
        };
        let profile = config.scoring.threshold_profile.clone();
        let thresholds = match &config.paths.thresholds_file {
            Some(path) => Thresholds::load(path, profile)
                .with_context(|| format!("failed to load thresholds from {}", path.display()))?,
            None => Thresholds::empty(profile),
        };
        Ok(Self::new(
            labels,
            thresholds,
            ScoringOptions::from_config(&config.scoring),
        ))
    }

    pub fn has_labels(&self) -> bool {
        self.labels.is_some()
    }

    pub fn options(&self) -> &ScoringOptions {
        &self.options
    }

    /// Ground-truth indices of `dataset` inside the `scored` slice of its full
    /// timestamp column, relative to the start of that slice.
    pub fn flags(
        &self,
        dataset: &str,
        timestamps: &[String],
        scored: Range<usize>,
    ) -> andeped_core::Result<Vec<usize>> {
        let labels = self.labels.as_ref().ok_or_else(|| AndepedError::MissingLabel {
            dataset: dataset.to_string(),
            label: "no labels file configured".into(),
        })?;
        labels.indices_within(dataset, timestamps, scored)
    }

    pub fn threshold(&self, algorithm: &str) -> andeped_core::Result<f64> {
        self.thresholds.threshold_for(algorithm)
    }

    /// Binarize `scores` with the algorithm's threshold and evaluate them.
    ///
    /// `scores` covers the `scored` slice of the dataset's `timestamps`.
    pub fn evaluate(
        &self,
        dataset: &str,
        algorithm: &str,
        timestamps: &[String],
        scored: Range<usize>,
        scores: &[f64],
    ) -> andeped_core::Result<Evaluation> {
        if scored.end > timestamps.len() || scores.len() != scored.len() {
            return Err(AndepedError::LengthMismatch {
                expected: scored.len().min(timestamps.len().saturating_sub(scored.start)),
                actual: scores.len(),
            });
        }
        let flags = self.flags(dataset, timestamps, scored)?;
        let detections = binarize(scores, self.threshold(algorithm)?);
        evaluate(&detections, &flags, &self.options)
    }
}

/// `andeped score`: evaluate an existing run record.
pub fn score_command(config: &HarnessConfig, args: &ScoreArgs) -> Result<Evaluation> {
    let context = ScoringContext::from_config(config)?;
    let record = RunRecord::import_csv(&args.record)
        .with_context(|| format!("failed to read run record {}", args.record.display()))?;
    let data = DataSeries::read(&args.data)?;
    let history = match &args.history {
        Some(path) => DataSeries::read(path)?.timestamps,
        None => Vec::new(),
    };
    let algorithm = resolve_algorithm(&record, args.algorithm.as_deref(), &args.record)?;

    let scored = history.len()..history.len() + data.len();
    let timestamps: Vec<String> = history.into_iter().chain(data.timestamps).collect();
    let evaluation = context
        .evaluate(&args.dataset, &algorithm, &timestamps, scored, &record.scores())
        .with_context(|| format!("failed to score {} / {}", algorithm, args.dataset))?;
    info!(
        algorithm = %algorithm,
        dataset = %args.dataset,
        precision = evaluation.metrics.precision,
        recall = evaluation.metrics.recall,
        f1 = evaluation.metrics.f1,
        "record scored"
    );
    Ok(evaluation)
}

fn resolve_algorithm(record: &RunRecord, explicit: Option<&str>, path: &Path) -> Result<String> {
    if let Some(name) = explicit {
        return Ok(name.to_string());
    }
    record
        .rows()
        .first()
        .map(|row| row.algorithm.clone())
        .with_context(|| format!("{} is empty and no --algorithm was given", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use andeped_compute::RecordRow;

    fn context() -> ScoringContext {
        let labels =
            GroundTruth::from_json_str(r#"{"realTraffic/speed_7578.csv": ["t5"]}"#).unwrap();
        let thresholds = Thresholds::from_json_str(
            r#"{"windowedGaussian": {"standard": {"threshold": 0.9}}}"#,
            "standard",
        )
        .unwrap();
        ScoringContext::new(Some(labels), thresholds, ScoringOptions::default())
    }

    fn timestamps(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("t{i}")).collect()
    }

    #[test]
    fn hit_inside_window() {
        let mut scores = vec![0.0; 20];
        scores[6] = 0.95;
        let eval = context()
            .evaluate("speed_7578", "windowedGaussian", &timestamps(20), 0..20, &scores)
            .unwrap();
        assert_eq!(eval.counts.true_positives, 1);
        assert_eq!(eval.metrics.recall, 1.0);
    }

    #[test]
    fn labels_in_other_half_are_ignored() {
        let labels = GroundTruth::from_json_str(r#"{"wave.csv": ["t2", "t13"]}"#).unwrap();
        let ctx = ScoringContext::new(
            Some(labels),
            Thresholds::empty("standard"),
            ScoringOptions::default(),
        );
        let ts = timestamps(20);
        // Offline half t0..t9, online half t10..t19.
        assert_eq!(ctx.flags("wave", &ts, 0..10).unwrap(), vec![2]);
        assert_eq!(ctx.flags("wave", &ts, 10..20).unwrap(), vec![3]);

        let mut scores = vec![0.0; 10];
        scores[3] = 0.9;
        let eval = ctx.evaluate("wave", "ReRe", &ts, 10..20, &scores).unwrap();
        assert_eq!(eval.counts.true_positives, 1);
    }

    #[test]
    fn label_missing_from_whole_dataset() {
        let labels = GroundTruth::from_json_str(r#"{"wave.csv": ["t2", "later"]}"#).unwrap();
        let ctx = ScoringContext::new(
            Some(labels),
            Thresholds::empty("standard"),
            ScoringOptions::default(),
        );
        assert!(matches!(
            ctx.flags("wave", &timestamps(20), 0..10),
            Err(AndepedError::MissingLabel { .. })
        ));
    }

    #[test]
    fn scores_must_cover_timestamps() {
        let err = context()
            .evaluate("speed_7578", "windowedGaussian", &timestamps(20), 0..20, &[0.0; 5])
            .unwrap_err();
        assert!(matches!(err, AndepedError::LengthMismatch { .. }));
    }

    #[test]
    fn no_labels_file() {
        let ctx = ScoringContext::new(None, Thresholds::empty("standard"), ScoringOptions::default());
        assert!(!ctx.has_labels());
        assert!(matches!(
            ctx.flags("x", &timestamps(3), 0..3),
            Err(AndepedError::MissingLabel { .. })
        ));
    }

    #[test]
    fn algorithm_from_record() {
        let mut record = RunRecord::new();
        record.push(RecordRow {
            algorithm: "bayesChangePt".into(),
            dataset: "d".into(),
            timestep: 0,
            original_value: 1.0,
            residual_value: 0.0,
            anomaly_score: 0.1,
        });
        let path = Path::new("r.csv");
        assert_eq!(resolve_algorithm(&record, None, path).unwrap(), "bayesChangePt");
        assert_eq!(resolve_algorithm(&record, Some("random"), path).unwrap(), "random");
        assert!(resolve_algorithm(&RunRecord::new(), None, path).is_err());
    }
}
