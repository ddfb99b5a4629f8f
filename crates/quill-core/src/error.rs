//! Unified error taxonomy for the engine.
//!
//! Every fallible operation in this crate surfaces one of the kinds below.
//! Buffer and command-log misuse (bad offsets, bad ranges) is a programming
//! fault and is reported loudly as [`CoreError::OutOfRange`] instead of being
//! silently clamped. I/O failures inside the concurrent subsystems (project
//! search, indexer) are logged per file and skipped; only save/open style
//! operations propagate [`CoreError::Io`] to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type CoreResult<T> = Result<T, CoreError>;

/// Error kinds surfaced by the engine.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A position or length exceeds the bounds of a buffer.
    #[error("position {position} out of range for buffer of length {length}")]
    OutOfRange {
        /// The offending byte position (or range end).
        position: usize,
        /// The buffer length at the time of the call.
        length: usize,
    },
    /// A caller-supplied argument is malformed (empty needle, bad pattern, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A read, write, or directory listing failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The path the operation was applied to.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// A search job observed its cancellation flag.
    #[error("operation cancelled")]
    Cancelled,
    /// A tab index, file path, or other addressed entity is absent.
    #[error("not found: {0}")]
    NotFound(String),
    /// The operation would violate an invariant the caller did not waive.
    #[error("conflict: {0}")]
    Conflict(String),
    /// A rename/create target already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),
}

impl CoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
