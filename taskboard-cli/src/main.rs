//! Taskboard CLI - a three-column kanban board in the terminal.
//!
//! Commands:
//! - `taskboard board`: Show the board, optionally filtered with `--search`
//! - `taskboard add <title>`: Add a task at the end of a column
//! - `taskboard move <id>`: Move a task to another column or position
//! - `taskboard drop <json>`: Apply a drag-and-drop result
//! - `taskboard edit <id>`: Change title, due date, priority or image
//! - `taskboard delete <id>`: Delete a task and its image
//! - `taskboard image <id>`: Print the public URL of a task's image
//! - `taskboard summary`: Summarize the board in a sentence or two
//! - `taskboard whoami`: Show the signed-in account
//! - `taskboard config`: Print the effective configuration
//!
//! Exit codes:
//! - 0: Success
//! - 1: Error

use clap::Parser;
use taskboard::{describe_config, severity_of, Cli, Commands, Session};
use taskboard_common::ErrorSeverity;
use taskboard_config::ConfigProvider;
use tracing_subscriber::EnvFilter;

async fn run(cli: Cli) -> anyhow::Result<String> {
    let mut provider = ConfigProvider::new();
    if let Some(path) = &cli.config {
        provider = provider.with_file(path);
    }
    // `config` shows the settings even when they do not validate
    if let Commands::Config = cli.command {
        return Ok(describe_config(&provider.load_unvalidated()?));
    }
    let config = provider.load()?;

    let mut session = Session::connect(&config).await?;
    session.execute(cli.command).await
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("taskboard=debug,taskboard_kanban=debug,taskboard_remote=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match run(cli).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            if severity_of(&e) == ErrorSeverity::Critical {
                eprintln!("Check the remote credentials and ids in your configuration (`taskboard config`).");
            }
            1
        }
    };

    std::process::exit(exit_code);
}
