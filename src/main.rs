//! kvfs shell - Entry Point
//!
//! Runs FTP-style commands read from stdin against an in-memory store.

use std::sync::Arc;

use log::{error, info};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use kvfs::protocol::{CommandStatus, handle_command, parse_command};
use kvfs::{DriverFactory, KvfsConfig, MemoryStore, Session};

const MAX_COMMAND_LENGTH: usize = 512;

#[tokio::main]
async fn main() {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    let config = match KvfsConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("Launching kvfs shell at {}", config.root_path);

    let factory = DriverFactory::new(Arc::new(MemoryStore::new()), config);
    let mut session = Session::new(factory.new_driver());

    if let Err(e) = run_shell(&mut session).await {
        error!("Shell terminated: {}", e);
    }
}

async fn run_shell(session: &mut Session) -> std::io::Result<()> {
    let mut reader = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let mut line = String::new();

    stdout.write_all(b"220 kvfs ready\r\n").await?;
    stdout.flush().await?;

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            info!("End of input");
            return Ok(());
        }

        if line.len() > MAX_COMMAND_LENGTH {
            stdout.write_all(b"500 Command too long\r\n").await?;
            continue;
        }

        let command = parse_command(&line);
        info!("Received: {:?}", command);

        let result = handle_command(session, &command).await;
        if let Some(msg) = &result.message {
            stdout.write_all(msg.as_bytes()).await?;
            stdout.flush().await?;
        }

        if result.status == CommandStatus::CloseConnection {
            return Ok(());
        }
    }
}
