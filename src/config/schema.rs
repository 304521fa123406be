//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the relay node.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address, advertised URL, body limits).
    pub listener: ListenerConfig,

    /// Remote destination the round-trip envelopes are sent to.
    pub destination: DestinationConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Secure overlay transport settings.
    pub transport: TransportConfig,

    /// Webhook processing endpoint settings.
    pub webhook: WebhookConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8484").
    pub bind_address: String,

    /// Advertised base URL for callbacks. When unset, the callback URL is
    /// derived from the bound address, which only works if the remote peer
    /// can reach it directly.
    pub public_url: Option<String>,

    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8484".to_string(),
            public_url: None,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Destination configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DestinationConfig {
    /// URL the outbound round-trip envelope is POSTed to. Round trips fail
    /// immediately when unset.
    pub url: Option<String>,
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Timeout for the outbound POST itself in seconds.
    pub send_secs: u64,

    /// Default time to wait for the remote peer's callback in seconds.
    /// Overridable per round-trip call.
    pub response_secs: u64,

    /// Per-request timeout on the local HTTP server in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            send_secs: 10,
            response_secs: 30,
            request_secs: 30,
        }
    }
}

/// Secure overlay transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TransportConfig {
    /// Overlay proxy URL (http or socks5). When unset, requests carrying a
    /// secure credential fall back to the plain client.
    pub proxy_url: Option<String>,
}

/// Webhook processing endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Enable the `/webhook` processing endpoint.
    pub enabled: bool,

    /// Processor stages applied in order. Known names: "echo", "transform",
    /// "validate", "count". Empty means identity (payload echoed unchanged).
    pub processors: Vec<String>,

    /// Top-level fields the "validate" processor requires.
    pub required_fields: Vec<String>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            processors: Vec::new(),
            required_fields: Vec::new(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9494".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();
        assert_eq!(config.listener.bind_address, "127.0.0.1:8484");
        assert!(config.destination.url.is_none());
        assert_eq!(config.timeouts.send_secs, 10);
        assert_eq!(config.timeouts.response_secs, 30);
        assert!(config.webhook.enabled);
        assert!(config.webhook.processors.is_empty());
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: RelayConfig = toml::from_str(
            r#"
            [destination]
            url = "http://peer.example:9000/webhook"

            [timeouts]
            response_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(
            config.destination.url.as_deref(),
            Some("http://peer.example:9000/webhook")
        );
        assert_eq!(config.timeouts.response_secs, 5);
        // Untouched sections keep their defaults.
        assert_eq!(config.timeouts.send_secs, 10);
        assert_eq!(config.listener.bind_address, "127.0.0.1:8484");
    }
}
