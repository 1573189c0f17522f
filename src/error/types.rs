//! Error types
//!
//! Defines the error types raised by the primitive store and by the
//! filesystem operations layered on top of it.

use thiserror::Error;

/// Errors reported by a primitive key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(String),

    #[error("invalid scan pattern: {0}")]
    InvalidPattern(String),

    #[error("store does not support {0}")]
    Unsupported(&'static str),

    /// Raised by the in-memory engine when a fault has been armed for a primitive.
    #[error("injected failure in {0}")]
    Injected(String),
}

/// Errors reported by filesystem operations.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("parent directory does not exist: {0}")]
    ParentNotFound(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("file too large: {path} exceeds {limit} bytes")]
    FileTooLarge { path: String, limit: u64 },

    /// The copy half of a rename landed but removing the source failed.
    /// Both paths may now hold the same data.
    #[error("rename {from} -> {to} copied data but failed to remove the source: {source}")]
    PartialRename {
        from: String,
        to: String,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FsError {
    /// Returns true for errors that mean the path does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::NotFound(_))
    }
}
