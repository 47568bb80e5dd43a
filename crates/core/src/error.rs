use thiserror::Error;

#[derive(Error, Debug)]
pub enum AndepedError {
    #[error("read from an empty buffer")]
    EmptyBuffer,

    #[error("detector '{detector}' violated the plugin contract: {reason}")]
    PluginContractViolation { detector: String, reason: String },

    #[error("degenerate decomposition: {0}")]
    DegenerateDecomposition(String),

    #[error("zero reference frequency: {0}")]
    ZeroFrequency(String),

    #[error("missing label for dataset '{dataset}': {label}")]
    MissingLabel { dataset: String, label: String },

    #[error("unknown detector: {0}")]
    UnknownDetector(String),

    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Serialization error: {0}")]
    Serialize(String),
}

impl From<serde_json::Error> for AndepedError {
    fn from(e: serde_json::Error) -> Self {
        AndepedError::Serialize(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AndepedError>;
