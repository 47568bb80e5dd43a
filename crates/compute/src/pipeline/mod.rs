//! Online pre-processing pipeline.
//!
//! Per incoming value: bounded buffer → per-call rescale → residual
//! extraction → detector → run record.
//!
//! Sub-modules:
//! - [`buffer`]: fixed-capacity sample FIFO
//! - [`rescale`]: stateless min-max mapping of a snapshot
//! - [`residual`]: recomputed and precomputed background removal
//! - [`controller`]: the per-sample orchestration
//! - [`record`]: per-run output rows and CSV export
//! - [`metrics`]: step latency tracking

pub mod buffer;
pub mod controller;
pub mod metrics;
pub mod record;
pub mod rescale;
pub mod residual;

pub use buffer::BoundedBuffer;
pub use controller::{RunContext, StreamingController};
pub use metrics::StreamMetrics;
pub use record::{RecordRow, RunRecord};
pub use rescale::{rescale, ScaleRange};
pub use residual::{ModePattern, ResidualExtractor};
