/// Status probe for monitored servers.
///
/// A probe is a single read-only query against the external status API,
/// keyed by the server's guid. The API is uncontrolled and frequently
/// flaky, so the contract is deliberately three-valued: a server is only
/// reported [`ProbeReport::Offline`] when the API positively says so, and
/// everything that cannot be interpreted becomes
/// [`ProbeReport::Ambiguous`], which callers must treat as alive. A false
/// restart kicks every player on the server; a missed one costs a poll
/// cycle. Retries belong to the caller, not the probe.
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Default status API endpoint, queried as `{base}/{guid}/?json=1`.
const DEFAULT_STATUS_BASE: &str = "https://battlelog.battlefield.com/bf4/servers/show/pc";

/// Marker inside the API's error envelope that positively identifies a
/// missing (offline/crashed) server.
const NOT_FOUND_MARKER: &str = "SERVER_INFO_NOT_FOUND";

/// Outcome of a single status probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeReport {
    /// The API returned server metadata. Name and address are passed along
    /// opportunistically when present so the monitor can refresh its
    /// descriptor caches.
    Online {
        name: Option<String>,
        address: Option<String>,
    },
    /// The API positively reported the server as not found.
    Offline,
    /// The API could not be queried or the response made no sense.
    /// Callers must fail open and treat this as alive.
    Ambiguous(String),
}

/// A single status query for one server.
#[async_trait]
pub trait StatusProbe: Send + Sync {
    /// Queries the status API for the server identified by `guid`.
    async fn probe(&self, guid: &str) -> ProbeReport;
}

/// HTTP implementation of [`StatusProbe`].
///
/// Uses a shared `reqwest::Client`, which also honors the standard
/// `HTTP_PROXY`/`HTTPS_PROXY` environment overrides for deployments that
/// must reach the status API through a forward proxy.
pub struct HttpStatusProbe {
    http: reqwest::Client,
    base_url: String,
}

impl HttpStatusProbe {
    /// Creates a probe against the default status API endpoint.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_STATUS_BASE)
    }

    /// Creates a probe against a custom endpoint (used by tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| crate::error::Error::Other(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    fn interpret(body: &Value) -> ProbeReport {
        if body.get("type").and_then(Value::as_str) == Some("error") {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if message.contains(NOT_FOUND_MARKER) {
                return ProbeReport::Offline;
            }
            return ProbeReport::Ambiguous(format!("unexpected error envelope: {}", message));
        }

        let name = body
            .pointer("/message/SERVER_INFO/name")
            .and_then(Value::as_str)
            .map(str::to_string);
        let address = body
            .pointer("/message/SERVER_INFO/ip")
            .and_then(Value::as_str)
            .map(str::to_string);

        ProbeReport::Online { name, address }
    }
}

#[async_trait]
impl StatusProbe for HttpStatusProbe {
    async fn probe(&self, guid: &str) -> ProbeReport {
        let url = format!("{}/{}/?json=1", self.base_url, guid);

        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(e) => return ProbeReport::Ambiguous(format!("status request failed: {}", e)),
        };

        match response.json::<Value>().await {
            Ok(body) => Self::interpret(&body),
            Err(e) => ProbeReport::Ambiguous(format!("malformed status response: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_envelope_with_marker_is_offline() {
        let body = json!({
            "type": "error",
            "message": "SERVER_INFO_NOT_FOUND: no such server"
        });
        assert_eq!(HttpStatusProbe::interpret(&body), ProbeReport::Offline);
    }

    #[test]
    fn test_error_envelope_without_marker_is_ambiguous() {
        let body = json!({ "type": "error", "message": "RATE_LIMITED" });
        assert!(matches!(
            HttpStatusProbe::interpret(&body),
            ProbeReport::Ambiguous(_)
        ));
    }

    #[test]
    fn test_success_envelope_carries_name_and_ip() {
        let body = json!({
            "type": "success",
            "message": { "SERVER_INFO": { "name": "My Server", "ip": "198.51.100.7" } }
        });
        assert_eq!(
            HttpStatusProbe::interpret(&body),
            ProbeReport::Online {
                name: Some("My Server".to_string()),
                address: Some("198.51.100.7".to_string()),
            }
        );
    }

    #[test]
    fn test_success_envelope_with_missing_fields_is_still_online() {
        let body = json!({ "type": "success", "message": {} });
        assert_eq!(
            HttpStatusProbe::interpret(&body),
            ProbeReport::Online {
                name: None,
                address: None,
            }
        );
    }
}
