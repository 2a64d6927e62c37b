//! Error types for CAMx file decoding.

use thiserror::Error;

/// Result type alias using CamxError.
pub type CamxResult<T> = Result<T, CamxError>;

/// Primary error type for CAMx decoding operations.
#[derive(Debug, Error)]
pub enum CamxError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Structural invariant of the binary format violated
    #[error("Invalid CAMx format: {0}")]
    Format(String),

    /// Caller-supplied rows/cols inconsistent with the inferred cell count
    #[error("The product of cols ({cols}) and rows ({rows}) must equal cells ({cells})")]
    DimensionMismatch {
        rows: usize,
        cols: usize,
        cells: usize,
    },

    /// Variable data inconsistent with its declared dimensions
    #[error("Variable shape error: {0}")]
    Shape(String),
}
