use anyhow::Result;
use repairdesk_core::tracing::{InstrumentationConfig, init_tracing};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::base_dir;

/// Initialize logging for the CLI
///
/// Logs always go to stderr. Unless disabled they are also appended to
/// `repairdesk.log` in the data directory.
pub fn init_logging(
    log_level: Level,
    data_dir: Option<PathBuf>,
    no_file_log: bool,
    json: bool,
) -> Result<()> {
    let directives = default_directives(log_level);

    if no_file_log {
        let config = InstrumentationConfig::new("repairdesk-cli", directives).with_json(json);
        return init_tracing(&config);
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| directives.into());

    let log_file_path = base_dir(data_dir.as_deref()).join("repairdesk.log");
    if let Some(parent) = log_file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(log_file))
                .with_ansi(false),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    Ok(())
}

fn default_directives(level: Level) -> String {
    let level_str = level.as_str().to_lowercase();
    format!("repairdesk={level_str},repairdesk_http={level_str},repairdesk_core={level_str}")
}
