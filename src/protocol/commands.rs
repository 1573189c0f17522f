//! Module `commands`
//!
//! Defines the commands the shell understands and the result structures
//! returned by their handlers. Verbs mirror the FTP commands a protocol
//! layer would map onto the filesystem operations.

/// A command parsed from one input line.
///
/// Commands that require arguments store them as `String` variants.
#[derive(Debug, PartialEq)]
pub enum Command {
    QUIT,
    PWD,
    CDUP,
    LIST(Option<String>),
    STAT(String),
    CWD(String),
    MKD(String),
    RMD(String),
    DELE(String),
    RNFR(String),
    RNTO(String),
    REST(u64),
    RETR(String),
    STOR { path: String, data: String },
    APPE { path: String, data: String },
    UNKNOWN,
}

/// Represents the outcome status of executing a command.
#[derive(Debug, PartialEq)]
pub enum CommandStatus {
    Success,
    Failure(String),
    CloseConnection,
}

/// Struct encapsulating the full result of a command execution.
#[derive(Debug)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub message: Option<String>,
}

impl CommandResult {
    pub fn success(message: String) -> Self {
        Self {
            status: CommandStatus::Success,
            message: Some(message),
        }
    }

    pub fn failure(reason: impl Into<String>, message: String) -> Self {
        Self {
            status: CommandStatus::Failure(reason.into()),
            message: Some(message),
        }
    }
}
