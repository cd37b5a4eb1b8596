use thiserror::Error;

/// Result type for forest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for forest operations
#[derive(Error, Debug)]
pub enum Error {
    /// The design's state machine was violated: a `Remove` without a matching
    /// `Add`, a category outside `[0, k)`, a negative variance, or any other
    /// condition the algorithm assumes can never happen.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// A caller-supplied parameter is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Ingestion-side failure: legend/row length mismatch, non-numeric field,
    /// a category index beyond `output_categories`. Never produced by the
    /// split/grow/ensemble path itself.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
