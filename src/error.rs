//! Error types for kinship.

use thiserror::Error;

/// Errors that can occur while building an LSH index or merging its groups.
#[derive(Debug, Error)]
pub enum LshError {
    /// Missing or invalid configuration parameter.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed input data.
    #[error("data integrity error: {0}")]
    DataIntegrity(String),

    /// A sample vector has the wrong number of coordinates.
    #[error("dimension mismatch for sample {id:?}: expected {expected}, got {actual}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },

    /// The same sample identifier was supplied twice.
    #[error("duplicate sample identifier: {0:?}")]
    DuplicateIdentifier(String),

    /// A coordinate field could not be read as a number.
    #[error("non-numeric coordinate {field:?} for sample {id:?}")]
    NonNumericCoordinate { id: String, field: String },

    /// A logic defect was detected while building the index.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),

    /// An operation was called before the stage it depends on.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// I/O error while reading input records.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of [`LshError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    DataIntegrity,
    InternalInvariant,
    InvalidState,
    Io,
}

impl LshError {
    /// The kind of failure, independent of the specific variant.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LshError::Configuration(_) => ErrorKind::Configuration,
            LshError::DataIntegrity(_)
            | LshError::DimensionMismatch { .. }
            | LshError::DuplicateIdentifier(_)
            | LshError::NonNumericCoordinate { .. } => ErrorKind::DataIntegrity,
            LshError::InternalInvariant(_) => ErrorKind::InternalInvariant,
            LshError::InvalidState(_) => ErrorKind::InvalidState,
            LshError::Io(_) => ErrorKind::Io,
        }
    }
}

/// Result type for kinship operations.
pub type Result<T> = std::result::Result<T, LshError>;
