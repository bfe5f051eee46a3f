use crate::error::{Error, Result};
use crate::server::{RestartTarget, ServerDescriptor, ServerId};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Panel credentials and automation endpoint.
///
/// The same authenticated panel identity is shared by every monitored
/// server, which is why the restart session is a single serialized
/// resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Panel account name or e-mail.
    pub user: String,
    /// Panel account password.
    pub password: String,
    /// WebDriver control-plane URL (e.g. a local geckodriver or a remote
    /// Selenium endpoint).
    #[serde(default = "default_webdriver_url")]
    pub webdriver: String,
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

/// Configuration for a single monitored server.
///
/// Exactly one of `restart_url` and `service_id` must be set; see
/// [`crate::config::validate_config`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerEntry {
    /// Identifier used to query the status API.
    pub guid: String,
    /// Restart endpoint on the classic panel.
    #[serde(rename = "restartUrl", default, skip_serializing_if = "Option::is_none")]
    pub restart_url: Option<String>,
    /// Service id on the alternate panel.
    #[serde(rename = "serviceId", default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<u64>,
}

/// Main configuration for the crash restarter.
///
/// # JSON Schema
///
/// ```json
/// {
///   "panel": {
///     "user": "ops@example.com",
///     "password": "secret",
///     "webdriver": "http://localhost:4444"
///   },
///   "webhook": "https://discord.com/api/webhooks/...",
///   "logLevel": "info",
///   "servers": [
///     { "guid": "abcd-1234", "restartUrl": "https://panel.example/1/restartService" },
///     { "guid": "efgh-5678", "serviceId": 1337 }
///   ]
/// }
/// ```
///
/// `webhook` is optional; when absent or empty, operator notifications are
/// silently disabled. `logLevel` is optional and only consulted when
/// `RUST_LOG` is unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Panel login and automation endpoint.
    pub panel: PanelConfig,
    /// Operator webhook URL; `None` disables notifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook: Option<String>,
    /// Default tracing filter, e.g. `"debug"`.
    #[serde(rename = "logLevel", default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    /// Monitored servers, in priority order.
    pub servers: Vec<ServerEntry>,
}

impl Config {
    /// Loads a configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its contents are not
    /// valid JSON conforming to the schema.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigParse(format!("Failed to read config file: {}", e)))?;

        Self::parse_from_str(&content)
    }

    /// Parses a configuration from a JSON string.
    pub fn parse_from_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| Error::ConfigParse(format!("Failed to parse JSON config: {}", e)))
    }

    /// Builds the server descriptors for the monitors, assigning ids
    /// sequentially from 1 in configuration order.
    ///
    /// Call [`crate::config::validate_config`] first; entries with an
    /// inconsistent restart target are skipped here with a warning rather
    /// than guessed at.
    pub fn descriptors(&self) -> Vec<ServerDescriptor> {
        let mut servers = Vec::with_capacity(self.servers.len());
        for (index, entry) in self.servers.iter().enumerate() {
            let id = ServerId(index as u32 + 1);
            let target = match (&entry.restart_url, entry.service_id) {
                (Some(url), None) => RestartTarget::PanelUrl(url.clone()),
                (None, Some(service_id)) => RestartTarget::ServiceId(service_id),
                _ => {
                    tracing::warn!(
                        server_id = %id,
                        guid = %entry.guid,
                        "Skipping server with inconsistent restart target"
                    );
                    continue;
                }
            };
            servers.push(ServerDescriptor::new(id, entry.guid.clone(), target));
        }
        servers
    }
}
