use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use andeped_core::{AndepedError, Mode, Result, RunParameters};

use crate::algorithms::Decomposer;
use crate::detectors::DetectorAdapter;

use super::buffer::BoundedBuffer;
use super::metrics::StreamMetrics;
use super::record::{RecordRow, RunRecord};
use super::rescale::{rescale, ScaleRange};
use super::residual::{ModePattern, ResidualExtractor};

/// Identity of one (algorithm, dataset) run. Owned by the run, never shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub algorithm: String,
    pub dataset: String,
}

impl RunContext {
    pub fn new(algorithm: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            dataset: dataset.into(),
        }
    }
}

/// Drives one streaming run: buffer, rescale, residual, detector, record.
///
/// Timesteps are strictly sequential; each one depends on the buffer state
/// left by the previous. Parallelism happens across controllers, not inside one.
#[derive(Debug)]
pub struct StreamingController {
    context: RunContext,
    buffer: BoundedBuffer,
    range: ScaleRange,
    extractor: ResidualExtractor,
    detector: DetectorAdapter,
    record: RunRecord,
    timestep: u64,
    metrics: StreamMetrics,
}

impl StreamingController {
    /// Build a controller and initialize its detector.
    pub fn new(
        context: RunContext,
        capacity: usize,
        range: ScaleRange,
        extractor: ResidualExtractor,
        mut detector: DetectorAdapter,
    ) -> Result<Self> {
        let buffer = BoundedBuffer::new(capacity)?;
        detector.initialize()?;
        info!(
            algorithm = %context.algorithm,
            dataset = %context.dataset,
            mode = %extractor.mode(),
            capacity,
            "streaming run initialized"
        );
        Ok(Self {
            context,
            buffer,
            range,
            extractor,
            detector,
            record: RunRecord::new(),
            timestep: 0,
            metrics: StreamMetrics::default(),
        })
    }

    /// Build from offline-prepared parameters. Mode II requires `pattern`.
    pub fn from_parameters(
        context: RunContext,
        mode: Mode,
        params: &RunParameters,
        range: ScaleRange,
        decomposer: Arc<dyn Decomposer>,
        pattern: Option<ModePattern>,
        detector: DetectorAdapter,
    ) -> Result<Self> {
        params.validate(mode)?;
        let extractor = match mode {
            Mode::Recomputed => ResidualExtractor::Recomputed {
                decomposer,
                alpha: params.alpha,
                mode_count: params.mode_count,
                length_budget: params.length_budget,
            },
            Mode::Precomputed => ResidualExtractor::Precomputed {
                pattern: pattern.ok_or_else(|| {
                    AndepedError::InvalidParameter(
                        "precomputed mode needs a mode pattern".into(),
                    )
                })?,
            },
        };
        Self::new(context, params.buffer_capacity(mode)?, range, extractor, detector)
    }

    /// Pre-fill the buffer with history so the first streamed value sees a full window.
    pub fn warm_up(&mut self, history: &[f64]) {
        self.buffer.load(history);
        debug!(loaded = self.buffer.len(), "buffer warmed up");
    }

    /// Process one incoming value and return the row it produced.
    pub fn next_timestep(&mut self, raw_value: f64) -> Result<&RecordRow> {
        let started = Instant::now();

        self.buffer.add(raw_value);
        let snapshot = self.buffer.snapshot();
        let rescaled = rescale(&snapshot, self.range);

        let residual_started = Instant::now();
        let residual = self.extractor.extract(&rescaled)?;
        let residual_elapsed = residual_started.elapsed();

        let residual_newest = *residual.last().ok_or_else(|| {
            AndepedError::DegenerateDecomposition("residual extraction returned nothing".into())
        })?;

        let score = self.detector.feed(residual_newest)?;

        let row = RecordRow {
            algorithm: self.context.algorithm.clone(),
            dataset: self.context.dataset.clone(),
            timestep: self.timestep,
            original_value: raw_value,
            residual_value: residual_newest,
            anomaly_score: score,
        };
        self.timestep += 1;
        self.metrics.record_step(started.elapsed(), residual_elapsed);

        Ok(self.record.push(row))
    }

    /// Stream every value in order. Stops at the first failure.
    pub fn run<I: IntoIterator<Item = f64>>(&mut self, values: I) -> Result<()> {
        for value in values {
            self.next_timestep(value)?;
        }
        info!(
            algorithm = %self.context.algorithm,
            dataset = %self.context.dataset,
            steps = self.metrics.steps,
            avg_step_us = self.metrics.avg_step_us,
            max_step_us = self.metrics.max_step_us,
            "streaming run finished"
        );
        Ok(())
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    pub fn timestep(&self) -> u64 {
        self.timestep
    }

    pub fn buffer(&self) -> &BoundedBuffer {
        &self.buffer
    }

    pub fn record(&self) -> &RunRecord {
        &self.record
    }

    pub fn into_record(self) -> RunRecord {
        self.record
    }

    pub fn metrics(&self) -> &StreamMetrics {
        &self.metrics
    }
}
