use std::time::Duration;

use serde::Serialize;

/// Per-run step latency, updated once per streamed sample.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StreamMetrics {
    /// Samples processed so far.
    pub steps: u64,
    /// Average end-to-end step latency in microseconds.
    pub avg_step_us: f64,
    /// Slowest step seen, in microseconds.
    pub max_step_us: f64,
    /// Average time spent in residual extraction, in microseconds.
    pub avg_residual_us: f64,

    #[serde(skip)]
    total_step_us: f64,
    #[serde(skip)]
    total_residual_us: f64,
}

impl StreamMetrics {
    /// Record one completed step and the share of it spent extracting the residual.
    pub fn record_step(&mut self, elapsed: Duration, residual: Duration) {
        let step_us = elapsed.as_secs_f64() * 1_000_000.0;
        let residual_us = residual.as_secs_f64() * 1_000_000.0;

        self.steps += 1;
        self.total_step_us += step_us;
        self.total_residual_us += residual_us;
        self.max_step_us = self.max_step_us.max(step_us);

        self.avg_step_us = self.total_step_us / self.steps as f64;
        self.avg_residual_us = self.total_residual_us / self.steps as f64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_and_max() {
        let mut m = StreamMetrics::default();
        m.record_step(Duration::from_micros(100), Duration::from_micros(80));
        m.record_step(Duration::from_micros(300), Duration::from_micros(200));
        assert_eq!(m.steps, 2);
        assert!((m.avg_step_us - 200.0).abs() < 1e-9);
        assert!((m.max_step_us - 300.0).abs() < 1e-9);
        assert!((m.avg_residual_us - 140.0).abs() < 1e-9);
    }

    #[test]
    fn internal_totals_not_serialized() {
        let json = serde_json::to_value(StreamMetrics::default()).unwrap();
        assert!(json.get("total_step_us").is_none());
        assert!(json.get("steps").is_some());
    }
}
