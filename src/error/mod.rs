//! Error handling
//!
//! Defines error types and their mapping to protocol reply codes.

pub mod handlers;
pub mod types;

pub use handlers::{error_to_ftp_code, handle_error};
pub use types::*;
