//! Configuration for tracing and instrumentation

use serde::{Deserialize, Serialize};

/// Main instrumentation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentationConfig {
    /// Service name for tracing
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Log filter directives (e.g., "info", "repairdesk_http=debug")
    pub log_level: String,
    /// Emit JSON lines instead of human readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self {
            service_name: "repairdesk".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: "info".to_string(),
            json: false,
        }
    }
}

impl InstrumentationConfig {
    /// Configuration for `service_name` filtered by `log_level`
    pub fn new(service_name: impl Into<String>, log_level: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            log_level: log_level.into(),
            ..Self::default()
        }
    }

    /// Switch to JSON output
    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InstrumentationConfig::default();
        assert_eq!(config.service_name, "repairdesk");
        assert_eq!(config.service_version, env!("CARGO_PKG_VERSION"));
        assert_eq!(config.log_level, "info");
        assert!(!config.json);
    }

    #[test]
    fn test_new_keeps_version() {
        let config = InstrumentationConfig::new("repairdesk-cli", "debug").with_json(true);
        assert_eq!(config.service_name, "repairdesk-cli");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.service_version, env!("CARGO_PKG_VERSION"));
        assert!(config.json);
    }

    #[test]
    fn test_json_flag_defaults_when_missing() {
        let config: InstrumentationConfig = serde_json::from_str(
            r#"{"service_name":"repairdesk","service_version":"0.1.0","log_level":"warn"}"#,
        )
        .unwrap();
        assert!(!config.json);
        assert_eq!(config.log_level, "warn");
    }
}
