//! Client configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! layered TOML files and `HUBLINK__*` environment variables. Each
//! sub-module represents a logical configuration section.

pub mod logging;
pub mod notification;
pub mod realtime;

use serde::{Deserialize, Serialize};

use self::logging::LoggingConfig;
use self::notification::NotificationConfig;
use self::realtime::RealtimeConfig;

use crate::error::AppError;

/// Root client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Realtime connection settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Notification tracking settings.
    #[serde(default)]
    pub notifications: NotificationConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration for the given environment.
    ///
    /// Merges `config/default`, the `config/{env}` overlay, and environment
    /// variables prefixed with `HUBLINK` (e.g. `HUBLINK__REALTIME__PATH`).
    /// Missing files are skipped.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("HUBLINK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Parse configuration from a TOML string, falling back to defaults for
    /// every missing field.
    pub fn from_toml(source: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source_yields_defaults() {
        let config = AppConfig::from_toml("").expect("empty config should parse");
        assert_eq!(config.realtime.path, "/hub");
        assert_eq!(config.realtime.reconnection_attempts, 5);
        assert_eq!(config.realtime.reconnection_delay_ms, 1000);
        assert!(config.realtime.auto_connect);
        assert!(config.notifications.pending_timeout_ms.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_override() {
        let config = AppConfig::from_toml(
            r#"
            [realtime]
            server_url = "wss://lab.example.com"
            reconnection_attempts = 2

            [notifications]
            dismiss_after_ms = 5000

            [logging]
            format = "pretty"
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.realtime.endpoint_url().unwrap().as_str(), "wss://lab.example.com/hub");
        assert_eq!(config.realtime.reconnection_attempts, 2);
        assert_eq!(config.realtime.reconnection_delay_ms, 1000);
        assert_eq!(config.notifications.dismiss_after_ms, Some(5000));
        assert_eq!(config.logging.format, "pretty");
    }
}
