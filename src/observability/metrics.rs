//! Metrics collection and exposition.
//!
//! Counter names follow `relay_<thing>_total` with an `outcome` label where
//! the result matters. The Prometheus exporter is optional and enabled by
//! config.

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// One round trip finished. Outcomes: delivered, timeout, send_error,
/// rejected, channel_closed.
pub fn record_roundtrip(outcome: &'static str) {
    counter!("relay_roundtrips_total", "outcome" => outcome).increment(1);
}

/// One inbound callback POST handled. Outcomes: delivered, not_found, gone,
/// bad_request.
pub fn record_callback(outcome: &'static str) {
    counter!("relay_callbacks_total", "outcome" => outcome).increment(1);
}

/// One webhook processing request finished its background path. Outcomes:
/// delivered, process_error, delivery_error, cancelled.
pub fn record_webhook(outcome: &'static str) {
    counter!("relay_webhooks_total", "outcome" => outcome).increment(1);
}

/// Secure transport setup failed and the plain client was used instead.
pub fn record_transport_fallback() {
    counter!("relay_transport_fallbacks_total").increment(1);
}
