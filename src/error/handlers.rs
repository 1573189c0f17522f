//! Error handlers
//!
//! Maps filesystem errors onto the reply codes a protocol layer sends back.

use crate::error::types::{FsError, StoreError};
use log::error;

/// Log a filesystem error that is about to be reported to a client
pub fn handle_error(err: &FsError) {
    error!("Filesystem error: {}", err);
}

/// Convert error to FTP reply code
pub fn error_to_ftp_code(err: &FsError) -> u16 {
    match err {
        FsError::NotFound(_) => 550,
        FsError::NotADirectory(_) => 550,
        FsError::ParentNotFound(_) => 550,
        FsError::InvalidPath(_) => 553,
        FsError::FileTooLarge { .. } => 552,
        FsError::PartialRename { .. } => 451,
        FsError::Store(StoreError::Unsupported(_)) => 502,
        FsError::Store(_) => 451,
        FsError::Io(_) => 426,
    }
}
