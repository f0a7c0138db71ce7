use thiserror::Error;

/// Why a raw payload was dropped before reaching the buffer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RejectReason {
    /// Not UTF-8, or not JSON at all.
    #[error("malformed payload: {reason}")]
    MalformedPayload { reason: String },

    /// Valid JSON, but not a `{x, y, z}` mapping with numeric axes.
    #[error("schema violation at {path}: {reason}")]
    SchemaViolation { path: String, reason: String },
}

impl RejectReason {
    /// Short label used for logging and the rejection counter.
    pub fn kind(&self) -> &'static str {
        match self {
            RejectReason::MalformedPayload { .. } => "malformed_payload",
            RejectReason::SchemaViolation { .. } => "schema_violation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("insufficient samples: {found} < {required}")]
    InsufficientSamples { found: usize, required: usize },

    #[error("degenerate signal (zero variance)")]
    DegenerateSignal,

    #[error("insufficient peaks: {found} < 2")]
    InsufficientPeaks { found: usize },

    /// Unexpected numeric failure; the only variant that is not folded into an estimate.
    #[error("numeric failure: {0}")]
    Numeric(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
