//! Webhook round-trip relay server.
//!
//! Starts the local HTTP server (callback + webhook endpoints) for a relay
//! node. Round trips against the configured destination are driven through
//! the library (`RoundTripClient`) or the `relay-cli` binary.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use webhook_relay::config::{self, RelayConfig};
use webhook_relay::correlation::CorrelationRegistry;
use webhook_relay::http::HttpServer;
use webhook_relay::lifecycle::Shutdown;
use webhook_relay::observability;
use webhook_relay::processor::build_processor;
use webhook_relay::transport::{ProxySecureTransport, SecureTransport, TransportSelector};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional config file path as the only argument.
    let relay_config = match std::env::args().nth(1) {
        Some(path) => config::load_config(Path::new(&path))?,
        None => RelayConfig::default(),
    };

    observability::init_logging(&relay_config.observability);

    tracing::info!(
        bind_address = %relay_config.listener.bind_address,
        destination = relay_config.destination.url.as_deref().unwrap_or("<unset>"),
        webhook_enabled = relay_config.webhook.enabled,
        "Configuration loaded"
    );

    if relay_config.observability.metrics_enabled {
        match relay_config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %relay_config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let send_timeout = Duration::from_secs(relay_config.timeouts.send_secs);
    let secure: Option<Arc<dyn SecureTransport>> = relay_config
        .transport
        .proxy_url
        .as_ref()
        .map(|url| {
            Arc::new(ProxySecureTransport::new(url.clone(), send_timeout)) as Arc<dyn SecureTransport>
        });

    let registry = Arc::new(CorrelationRegistry::new());
    let transport = Arc::new(TransportSelector::new(send_timeout, secure)?);
    let processor = build_processor(&relay_config.webhook)?;

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    let listener = TcpListener::bind(&relay_config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(relay_config, registry, processor, transport, shutdown.clone());
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
