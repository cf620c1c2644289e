//! Realtime connection configuration.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, ErrorKind};
use crate::result::AppResult;

/// Settings for the single bidirectional connection to the hub endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Server origin, e.g. `ws://127.0.0.1:3000`.
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Path the hub is mounted at.
    #[serde(default = "default_path")]
    pub path: String,
    /// Open the connection as soon as the handle is constructed.
    #[serde(default = "default_true")]
    pub auto_connect: bool,
    /// Reconnect automatically after a failed or dropped connection.
    #[serde(default = "default_true")]
    pub reconnection: bool,
    /// Reconnection attempts before giving up.
    #[serde(default = "default_reconnection_attempts")]
    pub reconnection_attempts: u32,
    /// Fixed delay between reconnection attempts, in milliseconds.
    #[serde(default = "default_reconnection_delay")]
    pub reconnection_delay_ms: u64,
    /// Upper bound for a single transport connect attempt, in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Outbound message buffer size.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer_size: usize,
}

impl RealtimeConfig {
    /// Endpoint URL: `server_url` with its path set to `path`.
    ///
    /// Fails with `CONNECTION_INIT` unless the server URL parses as a `ws` or
    /// `wss` URL with a non-empty host.
    pub fn endpoint_url(&self) -> AppResult<Url> {
        let mut url = Url::parse(&self.server_url).map_err(|e| {
            AppError::with_source(
                ErrorKind::ConnectionInit,
                format!("Invalid server URL {}", self.server_url),
                e,
            )
        })?;

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(AppError::connection_init(format!(
                "Unsupported endpoint scheme: {}",
                url.scheme()
            )));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(AppError::connection_init(format!(
                "Endpoint has no host: {}",
                self.server_url
            )));
        }

        let path = self.path.trim_start_matches('/');
        url.set_path(&format!("/{path}"));
        Ok(url)
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            path: default_path(),
            auto_connect: true,
            reconnection: true,
            reconnection_attempts: default_reconnection_attempts(),
            reconnection_delay_ms: default_reconnection_delay(),
            connect_timeout_seconds: default_connect_timeout(),
            outbound_buffer_size: default_outbound_buffer(),
        }
    }
}

fn default_server_url() -> String {
    "ws://127.0.0.1:3000".to_string()
}

fn default_path() -> String {
    "/hub".to_string()
}

fn default_true() -> bool {
    true
}

fn default_reconnection_attempts() -> u32 {
    5
}

fn default_reconnection_delay() -> u64 {
    1000
}

fn default_connect_timeout() -> u64 {
    20
}

fn default_outbound_buffer() -> usize {
    256
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_server(server_url: &str) -> RealtimeConfig {
        RealtimeConfig {
            server_url: server_url.to_string(),
            ..RealtimeConfig::default()
        }
    }

    #[test]
    fn test_endpoint_url_sets_path() {
        let mut config = with_server("ws://localhost:3000/");
        assert_eq!(config.endpoint_url().unwrap().as_str(), "ws://localhost:3000/hub");

        config.path = "hub".to_string();
        assert_eq!(config.endpoint_url().unwrap().as_str(), "ws://localhost:3000/hub");

        let config = with_server("wss://lab.example.com");
        let url = config.endpoint_url().unwrap();
        assert_eq!(url.host_str(), Some("lab.example.com"));
        assert_eq!(url.path(), "/hub");
    }

    #[test]
    fn test_endpoint_url_rejects_malformed_servers() {
        for server in [
            "ws://lab:notaport",
            "ws://exa mple",
            "ws://:80",
            "http://lab.example.com",
            "lab.example.com:3000",
            "",
        ] {
            let err = with_server(server).endpoint_url().unwrap_err();
            assert_eq!(err.kind, ErrorKind::ConnectionInit, "{server:?} should be rejected");
        }
    }
}
