//! RepairDesk CLI - command line client for the repair-shop backend

mod commands;
mod config;
mod logging;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use commands::Commands;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{Level, error, info};

#[derive(Parser)]
#[command(name = "repairdesk")]
#[command(about = "Command line client for the RepairDesk backend")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "info")]
    log_level: LogLevel,

    /// Configuration file (defaults to <data dir>/client.toml when present)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, overrides the configuration file
    #[arg(short = 'u', long, global = true, env = "REPAIRDESK_BASE_URL")]
    base_url: Option<String>,

    /// Data directory for configuration and logs
    #[arg(short = 'd', long, global = true)]
    data_dir: Option<PathBuf>,

    /// Timeout for one-shot commands in seconds (0 = no timeout)
    #[arg(short = 't', long, global = true, default_value = "30")]
    timeout: u64,

    /// Disable file logging (only log to stderr)
    #[arg(long, global = true)]
    no_file_log: bool,

    /// Log as JSON lines (with --no-file-log)
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_logging(
        cli.log_level.into(),
        cli.data_dir.clone(),
        cli.no_file_log,
        cli.log_json,
    )?;

    let config_path = cli.config.clone().or_else(|| {
        let default = config::default_config_path(cli.data_dir.as_deref());
        default.exists().then_some(default)
    });
    let mut client_config = config::load_client_config(config_path.as_deref())?;
    if let Some(base_url) = cli.base_url {
        client_config.base_url = base_url;
    }

    info!(base_url = %client_config.base_url, "Starting RepairDesk CLI");

    // Watch runs until interrupted, so the timeout does not apply to it
    let unbounded = cli.timeout == 0 || matches!(cli.command, Commands::Watch { .. });
    let command = cli.command.execute(client_config, cli.data_dir);

    let outcome = if unbounded {
        command.await
    } else {
        match tokio::time::timeout(Duration::from_secs(cli.timeout), command).await {
            Ok(result) => result,
            Err(_) => {
                error!("Command timed out after {} seconds", cli.timeout);
                std::process::exit(1);
            }
        }
    };

    if let Err(e) = outcome {
        error!("Command failed: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}
