use thiserror::Error;

/// Precondition failures raised at the library's API boundary
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TerrainError {
    #[error("grid dimensions must be positive, got {width}x{depth}")]
    InvalidDimensions { width: usize, depth: usize },

    #[error("expected {expected} samples, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("scale factor must be at least 1, got {0}")]
    InvalidScale(u32),

    #[error("traversal period must be positive and finite, got {0}")]
    InvalidPeriod(f64),

    #[error("a closed curve needs at least 2 control points, got {0}")]
    TooFewControlPoints(usize),
}

pub type Result<T> = std::result::Result<T, TerrainError>;
