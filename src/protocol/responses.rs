//! Response handling
//!
//! Defines reply codes and formatting.

/// Standard FTP reply codes
pub const FILE_STATUS_OK: u16 = 150;
pub const FILE_STATUS: u16 = 213;
pub const CLOSING: u16 = 221;
pub const TRANSFER_COMPLETE: u16 = 226;
pub const FILE_ACTION_OK: u16 = 250;
pub const PATH_CREATED: u16 = 257;
pub const PENDING_FURTHER_INFO: u16 = 350;
pub const SYNTAX_ERROR: u16 = 500;

/// Format a reply line
pub fn format_response(code: u16, message: &str) -> String {
    format!("{} {}\r\n", code, message)
}
