//! CLI commands

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use repairdesk_http::{AuthenticatedRequestClient, ClientConfig, ClientError};
use reqwest::Method;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config;

/// Credentials used by commands that need a session
#[derive(Args, Clone)]
pub struct Credentials {
    /// Account email
    #[arg(long, env = "REPAIRDESK_EMAIL")]
    email: String,

    /// Account password
    #[arg(long, env = "REPAIRDESK_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and print the account
    Login {
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Sign in and print what the backend reports for the session
    Status {
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Sign in and send a request to an API path
    Request {
        #[command(flatten)]
        credentials: Credentials,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// API path, e.g. /inquiries
        path: String,

        /// JSON request body
        #[arg(long)]
        data: Option<String>,
    },

    /// Sign in and keep the session alive until interrupted
    Watch {
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Generate default configuration files
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write the default client configuration
    Init {
        /// Output file path (defaults to <data dir>/client.toml)
        output: Option<PathBuf>,
    },

    /// Print the effective configuration
    Show,
}

impl Commands {
    pub async fn execute(self, client_config: ClientConfig, data_dir: Option<PathBuf>) -> Result<()> {
        match self {
            Self::Login { credentials } => {
                let client = connect(client_config, &credentials).await?;
                print_json(&serde_json::to_value(client.session().current())?)?;
                logout_quietly(&client).await;
                Ok(())
            }
            Self::Status { credentials } => {
                let client = connect(client_config, &credentials).await?;
                let profile = client.status().await?;
                print_json(&serde_json::to_value(profile)?)?;
                logout_quietly(&client).await;
                Ok(())
            }
            Self::Request {
                credentials,
                method,
                path,
                data,
            } => {
                let method = parse_method(&method)?;
                let body = data
                    .map(|d| serde_json::from_str::<Value>(&d))
                    .transpose()
                    .context("--data must be valid JSON")?;

                let client = connect(client_config, &credentials).await?;
                let result = client.request(method, &path, body).await;
                logout_quietly(&client).await;

                let response = result?;
                match response.json::<Value>() {
                    Ok(value) => print_json(&value)?,
                    Err(_) => println!("{}", response.text()),
                }
                Ok(())
            }
            Self::Watch { credentials } => {
                let client = connect(client_config, &credentials).await?;
                watch(&client).await
            }
            Self::Config { command } => match command {
                ConfigCommands::Init { output } => {
                    let path =
                        output.unwrap_or_else(|| config::default_config_path(data_dir.as_deref()));
                    config::generate_default_config(&path)?;
                    info!("Generated configuration at {}", path.display());
                    Ok(())
                }
                ConfigCommands::Show => {
                    println!("{}", toml::to_string_pretty(&client_config)?);
                    Ok(())
                }
            },
        }
    }
}

async fn connect(
    client_config: ClientConfig,
    credentials: &Credentials,
) -> Result<AuthenticatedRequestClient> {
    let client = AuthenticatedRequestClient::builder()
        .config(client_config)
        .build()?;

    match client.login(&credentials.email, &credentials.password).await {
        Ok(profile) => {
            info!(username = %profile.username, "signed in");
            Ok(client)
        }
        Err(ClientError::RateLimited {
            message,
            retry_after,
        }) => {
            let wait = retry_after.map_or_else(String::new, |d| {
                format!(" (retry in {}s)", d.as_secs())
            });
            bail!("{message}{wait}")
        }
        Err(err) => Err(err).context("login failed"),
    }
}

/// Keep the session alive through the silent refresh timer
async fn watch(client: &AuthenticatedRequestClient) -> Result<()> {
    let mut session = client.session().subscribe();
    info!(
        interval_secs = client.config().silent_refresh_secs,
        "keeping session alive, press Ctrl-C to stop"
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, signing out");
                logout_quietly(client).await;
                return Ok(());
            }
            changed = session.changed() => {
                if changed.is_err() || session.borrow_and_update().is_none() {
                    bail!("session ended: the access token could not be refreshed");
                }
            }
        }
    }
}

async fn logout_quietly(client: &AuthenticatedRequestClient) {
    if let Err(err) = client.logout().await {
        warn!(error = %err, "logout failed");
    }
}

fn parse_method(method: &str) -> Result<Method> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method: {method}"))?;
    Ok(method)
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_method_is_case_insensitive() {
        assert_eq!(parse_method("get").unwrap(), Method::GET);
        assert_eq!(parse_method("Delete").unwrap(), Method::DELETE);
        assert!(parse_method("NOT A METHOD").is_err());
    }
}
