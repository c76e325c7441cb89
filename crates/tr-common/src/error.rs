//! Error types for Trace Rewind.

use thiserror::Error;

/// Result type alias for Trace Rewind operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for Trace Rewind.
///
/// Dangling pid/fd references are deliberately not represented here:
/// events that miss their target are ignored by the replay semantics
/// (trace logs may start mid-stream), never surfaced as errors.
#[derive(Error, Debug)]
pub enum Error {
    // Log parsing errors (10-19)
    #[error("malformed record at line {line}: {message}")]
    MalformedRecord { line: usize, message: String },

    #[error("malformed event at frame {frame}: {message}")]
    MalformedEvent { frame: usize, message: String },

    // Navigation errors (20-29)
    #[error("frame {frame} out of range (log has {len} records)")]
    OutOfRange { frame: usize, len: usize },

    #[error("no records loaded")]
    EmptyLog,

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    /// Used for detailed error reporting in host integrations.
    pub fn code(&self) -> u32 {
        match self {
            Error::MalformedRecord { .. } => 10,
            Error::MalformedEvent { .. } => 11,
            Error::OutOfRange { .. } => 20,
            Error::EmptyLog => 21,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }
}
