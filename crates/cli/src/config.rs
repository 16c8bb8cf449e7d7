//! CLI configuration utilities

use anyhow::{Context, Result};
use repairdesk_core::load_settings;
use repairdesk_http::ClientConfig;
use std::path::{Path, PathBuf};

/// Environment prefix for configuration overrides, e.g. `REPAIRDESK_BASE_URL`
pub const ENV_PREFIX: &str = "REPAIRDESK";

/// Load client configuration from an optional file and the environment
pub fn load_client_config(path: Option<&Path>) -> Result<ClientConfig> {
    load_settings(path, ENV_PREFIX).context("failed to load client configuration")
}

/// Save client configuration as TOML
pub fn save_client_config<P: AsRef<Path>>(config: &ClientConfig, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Generate a default configuration file
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    save_client_config(&ClientConfig::default(), path)
}

/// Default location of the configuration file
pub fn default_config_path(data_dir: Option<&Path>) -> PathBuf {
    base_dir(data_dir).join("client.toml")
}

/// Directory holding configuration and logs
pub fn base_dir(data_dir: Option<&Path>) -> PathBuf {
    data_dir.map_or_else(
        || {
            std::env::var("REPAIRDESK_STATE_DIR").map_or_else(
                |_| {
                    dirs::data_dir()
                        .unwrap_or_else(|| PathBuf::from("."))
                        .join("repairdesk")
                },
                PathBuf::from,
            )
        },
        Path::to_path_buf,
    )
}
