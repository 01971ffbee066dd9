use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Process identity and logging settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Application {
    /// Application name, used as a field on log lines.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Port the serving shell listens on.
    #[serde(skip_serializing_if = "is_zero_u16")]
    pub port: u16,

    /// Log level directive (e.g. `info`, `debug`). Unparsable values fall
    /// back to `error`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub log_level: String,
}

/// Named client configurations, keyed by the dependency's logical name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Clients {
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub clients: HashMap<String, ClientConfig>,
}

/// Settings for one outbound HTTP client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Header name to values, sent on every request.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, Vec<String>>,

    /// Path probed by the readiness check (e.g. `/health`).
    #[serde(skip_serializing_if = "String::is_empty")]
    pub health: String,

    /// Request time limit in seconds, covering connect, redirects and
    /// reading the response. Zero means no limit.
    #[serde(skip_serializing_if = "is_zero_u64")]
    pub timeout: u64,

    /// Absolute base URL of the dependency.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
}

impl ClientConfig {
    /// Config for `url` with no headers, health path or timeout.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_health(mut self, health: impl Into<String>) -> Self {
        self.health = health.into();
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// The configured timeout, or `None` when it is zero.
    pub fn timeout_duration(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }
}

fn is_zero_u16(v: &u16) -> bool {
    *v == 0
}

fn is_zero_u64(v: &u64) -> bool {
    *v == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_means_unbounded() {
        assert_eq!(ClientConfig::new("http://a").timeout_duration(), None);
        assert_eq!(
            ClientConfig::new("http://a").with_timeout(3).timeout_duration(),
            Some(Duration::from_secs(3))
        );
    }

    #[test]
    fn client_config_deserializes_from_json() {
        let conf: ClientConfig = serde_json::from_value(serde_json::json!({
            "url": "http://billing:8080",
            "health": "/health",
            "timeout": 5,
            "headers": {"X-Api-Key": ["abc"], "Accept": ["application/json", "text/plain"]}
        }))
        .unwrap();

        assert_eq!(conf.url, "http://billing:8080");
        assert_eq!(conf.health, "/health");
        assert_eq!(conf.timeout, 5);
        assert_eq!(conf.headers["Accept"].len(), 2);
    }

    #[test]
    fn empty_fields_are_omitted_when_serialized() {
        let json = serde_json::to_value(ClientConfig::new("http://a")).unwrap();
        assert_eq!(json, serde_json::json!({"url": "http://a"}));
    }

    #[test]
    fn with_header_appends_values() {
        let conf = ClientConfig::new("http://a")
            .with_header("Accept", "a")
            .with_header("Accept", "b");
        assert_eq!(conf.headers["Accept"], vec!["a", "b"]);
    }
}
