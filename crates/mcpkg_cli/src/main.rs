//! `mcpkg` command-line entry point.
//!
//! # Responsibility
//! - Resolve the data directory and log level, then start file logging.
//! - Run one command and translate failures into exit codes.

mod cli;
mod commands;
mod error;

use clap::Parser;
use cli::Cli;
use commands::Console;
use error::CliError;
use log::{error, info};
use mcpkg_core::{init_logging, resolve_log_level, WorkspaceLocator};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const LOG_DIR_NAME: &str = "logs";

fn main() -> ExitCode {
    let cli = Cli::parse();
    match start(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_exit module=cli status=error exit_code={}", err.exit_code());
            eprintln!("Error: {err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

fn start(cli: Cli) -> Result<(), CliError> {
    let locator = match &cli.data_dir {
        Some(dir) => WorkspaceLocator::new(absolute(dir)?),
        None => WorkspaceLocator::from_env()?,
    };
    let log_dir = locator.data_dir()?.join(LOG_DIR_NAME);
    let level = resolve_log_level(cli.log_level.as_deref());
    init_logging(&level, &absolute(&log_dir)?)?;
    info!("event=cli_start module=cli status=ok");

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let json = cli.json;
    let mut console = Console::new(stdin.lock(), stdout.lock(), json);
    commands::run(cli, &locator, &mut console)
}

fn absolute(path: &Path) -> Result<PathBuf, CliError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })
}
