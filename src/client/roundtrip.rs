//! Round-trip orchestration.
//!
//! `RoundTripClient` sends a payload to the configured destination and
//! blocks (with a timeout) until the remote peer POSTs a correlated callback
//! to this process's own `/roundtrip` endpoint.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use url::Url;
use uuid::Uuid;

use crate::client::types::{Envelope, RoundTripOptions, RoundTripResult};
use crate::config::{DestinationConfig, TimeoutConfig};
use crate::correlation::CorrelationRegistry;
use crate::http::ServerHandle;
use crate::observability::metrics;
use crate::transport::TransportSelector;

/// Orchestrates round trips against a single configured destination.
pub struct RoundTripClient {
    destination: Option<String>,
    default_timeout: Duration,
    registry: Arc<CorrelationRegistry>,
    transport: Arc<TransportSelector>,
    server: ServerHandle,
}

/// Removes the registry entry when dropped, so every exit path of
/// [`RoundTripClient::round_trip_post`] releases it.
struct Registration {
    registry: Arc<CorrelationRegistry>,
    request_id: String,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.unregister(&self.request_id);
    }
}

impl RoundTripClient {
    pub fn new(
        destination: &DestinationConfig,
        timeouts: &TimeoutConfig,
        registry: Arc<CorrelationRegistry>,
        transport: Arc<TransportSelector>,
        server: ServerHandle,
    ) -> Self {
        Self {
            destination: destination.url.clone(),
            default_timeout: Duration::from_secs(timeouts.response_secs),
            registry,
            transport,
            server,
        }
    }

    /// POST `payload` to the destination and wait for the correlated
    /// callback.
    ///
    /// All failures come back as a structured [`RoundTripResult`]; this
    /// method does not return `Err` and does not panic on bad input.
    pub async fn round_trip_post(&self, payload: Value, opts: RoundTripOptions) -> RoundTripResult {
        let caller_id = opts.request_id.clone().unwrap_or_default();

        // Preconditions: a destination and a running callback server. No
        // network call is attempted when either is missing.
        let destination = match &self.destination {
            Some(url) => url.clone(),
            None => {
                metrics::record_roundtrip("rejected");
                return RoundTripResult::failed(caller_id, "no destination URL configured");
            }
        };
        if let Err(e) = Url::parse(&destination) {
            metrics::record_roundtrip("rejected");
            return RoundTripResult::failed(
                caller_id,
                format!("destination URL `{destination}` is invalid: {e}"),
            );
        }
        let callback_url = match self.server.callback_url() {
            Some(url) => url,
            None => {
                metrics::record_roundtrip("rejected");
                return RoundTripResult::failed(caller_id, "callback server is not running");
            }
        };

        let request_id = match opts.request_id.filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => Uuid::new_v4().to_string(),
        };

        let rx = match self.registry.register(&request_id) {
            Ok(rx) => rx,
            Err(e) => {
                metrics::record_roundtrip("rejected");
                return RoundTripResult::failed(request_id, e.to_string());
            }
        };
        // Scoped release: dropped on every return below.
        let _registration = Registration {
            registry: self.registry.clone(),
            request_id: request_id.clone(),
        };

        let envelope = Envelope {
            url: callback_url.to_string(),
            payload,
            request_id: Some(request_id.clone()),
            secure_key: opts.secure_key.clone(),
        };

        tracing::debug!(
            request_id = %request_id,
            destination = %destination,
            "Sending round-trip envelope"
        );

        let client = self.transport.select(opts.secure_key.as_deref());
        let response = match client.post(&destination).json(&envelope).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "Round-trip send failed");
                metrics::record_roundtrip("send_error");
                return RoundTripResult::failed(request_id, format!("send failed: {e}"));
            }
        };

        // A non-2xx acknowledgment means no callback can be expected;
        // short-circuit instead of waiting.
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                request_id = %request_id,
                status = %status,
                "Destination rejected round-trip envelope"
            );
            metrics::record_roundtrip("send_error");
            return RoundTripResult::failed(request_id, format!("destination returned {status}"));
        }

        let wait = opts.timeout.unwrap_or(self.default_timeout);
        match tokio::time::timeout(wait, rx).await {
            Ok(Ok(body)) => {
                tracing::debug!(request_id = %request_id, "Round trip resolved by callback");
                metrics::record_roundtrip("delivered");
                RoundTripResult::from_callback(request_id, body)
            }
            Ok(Err(_)) => {
                // Sender dropped without a send: the registry entry vanished
                // under us, which register()/unregister() discipline rules out.
                metrics::record_roundtrip("channel_closed");
                RoundTripResult::failed(request_id, "delivery channel closed before a callback arrived")
            }
            Err(_) => {
                tracing::debug!(request_id = %request_id, wait = ?wait, "Round trip timed out");
                metrics::record_roundtrip("timeout");
                RoundTripResult::timeout(request_id, wait)
            }
        }
    }

    /// Number of round trips currently awaiting a callback.
    pub fn in_flight(&self) -> usize {
        self.registry.len()
    }
}
