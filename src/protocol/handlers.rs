//! Command handlers module.
//!
//! Each handler runs one filesystem operation through the session and turns
//! its outcome into a reply. Errors are mapped to reply codes by
//! [`error_to_ftp_code`].

use std::io::Read;

use log::info;

use crate::error::{FsError, error_to_ftp_code, handle_error};
use crate::navigate::Session;
use crate::protocol::commands::{Command, CommandResult, CommandStatus};
use crate::protocol::responses::*;

/// Dispatches a parsed command to its handler.
pub async fn handle_command(session: &mut Session, command: &Command) -> CommandResult {
    match command {
        Command::QUIT => handle_cmd_quit(),
        Command::PWD => handle_cmd_pwd(session),
        Command::CDUP => handle_cmd_cwd(session, ".."),
        Command::CWD(path) => handle_cmd_cwd(session, path),
        Command::LIST(path) => handle_cmd_list(session, path.as_deref()),
        Command::STAT(path) => handle_cmd_stat(session, path),
        Command::MKD(path) => handle_cmd_mkd(session, path),
        Command::RMD(path) => handle_cmd_rmd(session, path),
        Command::DELE(path) => handle_cmd_dele(session, path),
        Command::RNFR(path) => handle_cmd_rnfr(session, path),
        Command::RNTO(path) => handle_cmd_rnto(session, path),
        Command::REST(offset) => handle_cmd_rest(session, *offset),
        Command::RETR(path) => handle_cmd_retr(session, path),
        Command::STOR { path, data } => handle_cmd_store(session, path, data, false).await,
        Command::APPE { path, data } => handle_cmd_store(session, path, data, true).await,
        Command::UNKNOWN => handle_cmd_unknown(),
    }
}

/// Builds a failure reply from a filesystem error.
fn fs_failure(err: FsError) -> CommandResult {
    handle_error(&err);
    let code = error_to_ftp_code(&err);
    let reason = err.to_string();
    CommandResult::failure(reason.clone(), format_response(code, &reason))
}

fn handle_cmd_quit() -> CommandResult {
    CommandResult {
        status: CommandStatus::CloseConnection,
        message: Some(format_response(CLOSING, "Goodbye")),
    }
}

fn handle_cmd_pwd(session: &Session) -> CommandResult {
    CommandResult::success(format_response(
        PATH_CREATED,
        &format!("\"{}\" is the current directory", session.cwd()),
    ))
}

fn handle_cmd_cwd(session: &mut Session, path: &str) -> CommandResult {
    match session.change_dir(path) {
        Ok(new_path) => CommandResult::success(format_response(
            FILE_ACTION_OK,
            &format!("Directory changed to {new_path}"),
        )),
        Err(e) => fs_failure(e),
    }
}

fn handle_cmd_list(session: &Session, path: Option<&str>) -> CommandResult {
    match session.list(path) {
        Ok(entries) => {
            let mut listing = String::new();
            for entry in &entries {
                listing.push_str(&entry.list_line());
                listing.push_str("\r\n");
            }
            listing.push_str(&format_response(
                TRANSFER_COMPLETE,
                &format!("{} entries", entries.len()),
            ));
            CommandResult::success(listing)
        }
        Err(e) => fs_failure(e),
    }
}

fn handle_cmd_stat(session: &Session, path: &str) -> CommandResult {
    match session.stat(path) {
        Ok(entry) => CommandResult::success(format_response(FILE_STATUS, &entry.list_line())),
        Err(e) => fs_failure(e),
    }
}

fn handle_cmd_mkd(session: &Session, path: &str) -> CommandResult {
    match session.make_dir(path) {
        Ok(created) => {
            CommandResult::success(format_response(PATH_CREATED, &format!("\"{created}\" created")))
        }
        Err(e) => fs_failure(e),
    }
}

fn handle_cmd_rmd(session: &Session, path: &str) -> CommandResult {
    match session.remove_dir(path) {
        Ok(removed) => CommandResult::success(format_response(
            FILE_ACTION_OK,
            &format!("Directory removed ({removed} keys)"),
        )),
        Err(e) => fs_failure(e),
    }
}

fn handle_cmd_dele(session: &Session, path: &str) -> CommandResult {
    match session.delete_file(path) {
        Ok(()) => CommandResult::success(format_response(FILE_ACTION_OK, "File deleted")),
        Err(e) => fs_failure(e),
    }
}

fn handle_cmd_rnfr(session: &mut Session, path: &str) -> CommandResult {
    match session.rename_from(path) {
        Ok(()) => CommandResult::success(format_response(
            PENDING_FURTHER_INFO,
            "Ready for destination name",
        )),
        Err(e) => fs_failure(e),
    }
}

fn handle_cmd_rnto(session: &mut Session, path: &str) -> CommandResult {
    match session.rename_to(path) {
        Ok(()) => CommandResult::success(format_response(FILE_ACTION_OK, "Rename successful")),
        Err(e) => fs_failure(e),
    }
}

fn handle_cmd_rest(session: &mut Session, offset: u64) -> CommandResult {
    session.set_restart_offset(offset);
    CommandResult::success(format_response(
        PENDING_FURTHER_INFO,
        &format!("Restarting at {offset}"),
    ))
}

/// Reads the whole file into the reply; the shell has no separate data channel.
fn handle_cmd_retr(session: &mut Session, path: &str) -> CommandResult {
    let (len, mut reader) = match session.retrieve(path) {
        Ok(opened) => opened,
        Err(e) => return fs_failure(e),
    };

    let mut content = Vec::with_capacity(len as usize);
    if let Err(e) = reader.read_to_end(&mut content) {
        return fs_failure(FsError::Io(e));
    }
    info!("Sent {} bytes of {}", content.len(), path);

    let mut message = format_response(FILE_STATUS_OK, &format!("Opening {path} ({len} bytes)"));
    message.push_str(&String::from_utf8_lossy(&content));
    message.push_str("\r\n");
    message.push_str(&format_response(TRANSFER_COMPLETE, "Transfer complete"));
    CommandResult::success(message)
}

async fn handle_cmd_store(
    session: &Session,
    path: &str,
    data: &str,
    append: bool,
) -> CommandResult {
    match session.store(path, data.as_bytes(), append).await {
        Ok(size) => CommandResult::success(format_response(
            TRANSFER_COMPLETE,
            &format!("Transfer complete ({size} bytes)"),
        )),
        Err(e) => fs_failure(e),
    }
}

fn handle_cmd_unknown() -> CommandResult {
    CommandResult::failure(
        "Unknown command",
        format_response(SYNTAX_ERROR, "Syntax error, command unrecognized"),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::KvfsConfig;
    use crate::protocol::parse_command;
    use crate::storage::Driver;
    use crate::store::MemoryStore;

    fn session() -> Session {
        Session::new(Driver::new(
            Arc::new(MemoryStore::new()),
            Arc::new(KvfsConfig::default()),
        ))
    }

    async fn run(session: &mut Session, line: &str) -> CommandResult {
        handle_command(session, &parse_command(line)).await
    }

    fn message(result: &CommandResult) -> &str {
        result.message.as_deref().unwrap_or("")
    }

    #[tokio::test]
    async fn test_store_list_retrieve() {
        let mut session = session();
        assert!(message(&run(&mut session, "MKD docs").await).starts_with("257"));
        assert!(message(&run(&mut session, "STOR docs/a.txt hello").await).starts_with("226"));

        let listing = run(&mut session, "LIST docs").await;
        assert!(message(&listing).contains("a.txt"));
        assert!(message(&listing).contains("226 1 entries"));

        run(&mut session, "REST 2").await;
        let retr = run(&mut session, "RETR docs/a.txt").await;
        assert!(message(&retr).contains("(3 bytes)"));
        assert!(message(&retr).contains("llo\r\n"));
    }

    #[tokio::test]
    async fn test_failures_carry_reply_codes() {
        let mut session = session();
        let result = run(&mut session, "CWD nowhere").await;
        assert!(matches!(result.status, CommandStatus::Failure(_)));
        assert!(message(&result).starts_with("550"));

        assert!(message(&run(&mut session, "RNTO b").await).starts_with("553"));
        assert!(message(&run(&mut session, "BOGUS").await).starts_with("500"));
    }

    #[tokio::test]
    async fn test_quit_closes() {
        let mut session = session();
        assert_eq!(run(&mut session, "QUIT").await.status, CommandStatus::CloseConnection);
    }
}
