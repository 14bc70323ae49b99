// In: src/error.rs

//! This module defines the single, unified error type for the entire flatrow library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.
//!
//! Every variant except the wrappers is a contract violation: the caller handed
//! the codec a buffer, a batch or a type tree that does not honour the row
//! format contract. None of them are retryable.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlatRowError {
    // =========================================================================
    // === Contract Violations (Specific to the row format)
    // =========================================================================
    #[error("Unsupported data type for the flat row format: {0}")]
    UnsupportedType(String),

    #[error("Type mismatch between type tree and columnar data: {0}")]
    TypeMismatch(String),

    #[error("Destination buffer too small: row needs {required} bytes, buffer holds {capacity}")]
    BufferTooSmall { required: usize, capacity: usize },

    #[error("Malformed row: {0}")]
    MalformedRow(String),

    #[error("Row of {size} bytes exceeds the limit of {limit} bytes")]
    RowTooLarge { size: usize, limit: usize },

    #[error("Row {row} was sized at {computed} bytes but {written} bytes were written")]
    SizeMismatch {
        row: usize,
        computed: usize,
        written: usize,
    },

    #[error("Row index {index} is out of bounds for a batch of {num_rows} rows")]
    RowOutOfBounds { index: usize, num_rows: usize },

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the Arrow library.
    #[error("Arrow operation failed: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// An error from the Serde JSON library, typically while loading a `CodecConfig`.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// An error for Python FFI (Foreign Function Interface) operations.
    #[error("FFI operation failed: {0}")]
    FfiError(String), // PyErr doesn't impl Error, so we can't use #[from] here.
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FlatRowError>;

impl FlatRowError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        FlatRowError::MalformedRow(msg.into())
    }
}

// =============================================================================
// === Manual `From` Implementations ===
// =============================================================================

#[cfg(feature = "python")]
impl From<pyo3::PyErr> for FlatRowError {
    fn from(err: pyo3::PyErr) -> Self {
        FlatRowError::FfiError(err.to_string())
    }
}

#[cfg(feature = "python")]
impl From<FlatRowError> for pyo3::PyErr {
    fn from(err: FlatRowError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
