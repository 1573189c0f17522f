//! Command parser
//!
//! Turns a raw input line into a [`Command`].

use crate::protocol::commands::Command;

/// Parses a raw command string into the `Command` enum.
///
/// Validates required arguments and returns `UNKNOWN` if a known command is
/// misused. `STOR` and `APPE` take the path followed by inline content.
pub fn parse_command(raw: &str) -> Command {
    let trimmed = raw.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("").to_ascii_uppercase();
    let arg = parts.next().unwrap_or("").trim();

    match cmd.as_str() {
        "QUIT" | "Q" => Command::QUIT,
        "PWD" => Command::PWD,
        "CDUP" => Command::CDUP,
        "LIST" | "LS" => Command::LIST((!arg.is_empty()).then(|| arg.to_string())),
        "STAT" if !arg.is_empty() => Command::STAT(arg.to_string()),
        "CWD" | "CD" if !arg.is_empty() => Command::CWD(arg.to_string()),
        "MKD" if !arg.is_empty() => Command::MKD(arg.to_string()),
        "RMD" if !arg.is_empty() => Command::RMD(arg.to_string()),
        "DELE" if !arg.is_empty() => Command::DELE(arg.to_string()),
        "RNFR" if !arg.is_empty() => Command::RNFR(arg.to_string()),
        "RNTO" if !arg.is_empty() => Command::RNTO(arg.to_string()),
        "REST" => arg.parse().map(Command::REST).unwrap_or(Command::UNKNOWN),
        "RETR" if !arg.is_empty() => Command::RETR(arg.to_string()),
        "STOR" | "APPE" if !arg.is_empty() => {
            let mut split = arg.splitn(2, char::is_whitespace);
            let path = split.next().unwrap_or("").to_string();
            let data = split.next().unwrap_or("").to_string();
            if cmd == "STOR" {
                Command::STOR { path, data }
            } else {
                Command::APPE { path, data }
            }
        }
        _ => Command::UNKNOWN,
    }
}
