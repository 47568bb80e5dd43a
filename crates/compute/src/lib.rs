pub mod algorithms;
pub mod detectors;
pub mod offline;
pub mod pipeline;

pub use algorithms::{Decomposer, Decomposition, Vmd};
pub use detectors::{Detector, DetectorAdapter, DetectorKind, DetectorOptions};
pub use pipeline::{
    BoundedBuffer, ModePattern, RecordRow, ResidualExtractor, RunContext, RunRecord, ScaleRange,
    StreamMetrics, StreamingController,
};
