//! Navigate module
//!
//! Handles directory navigation for sessions, including changing
//! directories and resolving client paths against the current one.

mod operations;
mod session;

// Re-export public types and functions
pub use operations::resolve_path;
pub use session::Session;
