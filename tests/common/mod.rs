//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::Json, http::StatusCode, routing::post, Router};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use webhook_relay::client::RoundTripClient;
use webhook_relay::config::RelayConfig;
use webhook_relay::correlation::CorrelationRegistry;
use webhook_relay::http::HttpServer;
use webhook_relay::lifecycle::Shutdown;
use webhook_relay::processor::build_processor;
use webhook_relay::transport::{ProxySecureTransport, SecureTransport, TransportSelector};

/// A running relay node under test.
pub struct RelayHarness {
    pub client: Arc<RoundTripClient>,
    pub registry: Arc<CorrelationRegistry>,
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl RelayHarness {
    pub fn callback_endpoint(&self) -> String {
        format!("http://{}/roundtrip", self.addr)
    }

    pub fn webhook_endpoint(&self) -> String {
        format!("http://{}/webhook", self.addr)
    }
}

impl Drop for RelayHarness {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a relay node on an ephemeral port and wait until it serves.
pub async fn spawn_relay(mut config: RelayConfig) -> RelayHarness {
    config.listener.bind_address = "127.0.0.1:0".to_string();

    let send_timeout = Duration::from_secs(config.timeouts.send_secs);
    let secure: Option<Arc<dyn SecureTransport>> = config.transport.proxy_url.clone().map(|url| {
        Arc::new(ProxySecureTransport::new(url, send_timeout)) as Arc<dyn SecureTransport>
    });

    let registry = Arc::new(CorrelationRegistry::new());
    let transport = Arc::new(TransportSelector::new(send_timeout, secure).unwrap());
    let processor = build_processor(&config.webhook).unwrap();
    let shutdown = Shutdown::new();

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(
        config.clone(),
        registry.clone(),
        processor,
        transport.clone(),
        shutdown.clone(),
    );
    let handle = server.handle();
    let client = Arc::new(RoundTripClient::new(
        &config.destination,
        &config.timeouts,
        registry.clone(),
        transport,
        handle.clone(),
    ));

    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    while !handle.is_running() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    RelayHarness {
        client,
        registry,
        addr,
        shutdown,
    }
}

/// Serve an axum app on an ephemeral port, returning its base URL.
pub async fn serve_app(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Peer that acknowledges each envelope and POSTs the payload back to the
/// envelope's callback URL, tagged with the request ID it handled.
pub async fn start_echo_peer() -> String {
    async fn ingest(Json(envelope): Json<Value>) -> &'static str {
        let url = envelope["url"].as_str().unwrap_or_default().to_string();
        let request_id = envelope["request_id"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        let mut payload = envelope["payload"].clone();
        if let Some(map) = payload.as_object_mut() {
            map.insert("handled_request".to_string(), Value::from(request_id.clone()));
        }
        tokio::spawn(async move {
            let body = serde_json::json!({"request_id": request_id, "payload": payload});
            let _ = reqwest::Client::new().post(&url).json(&body).send().await;
        });
        "ok"
    }

    let base = serve_app(Router::new().route("/ingest", post(ingest))).await;
    format!("{base}/ingest")
}

/// Peer that acknowledges envelopes but never calls back.
pub async fn start_ack_only_peer() -> String {
    let base = serve_app(Router::new().route("/ingest", post(|| async { "ok" }))).await;
    format!("{base}/ingest")
}

/// Peer that rejects every envelope with a 500.
pub async fn start_rejecting_peer() -> String {
    let base = serve_app(Router::new().route(
        "/ingest",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "nope") }),
    ))
    .await;
    format!("{base}/ingest")
}

/// Collector that records every JSON body POSTed to it.
pub async fn start_capture_server() -> (String, mpsc::UnboundedReceiver<Value>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let app = Router::new().route(
        "/collect",
        post(move |Json(body): Json<Value>| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(body);
                "ok"
            }
        }),
    );
    let base = serve_app(app).await;
    (format!("{base}/collect"), rx)
}

/// Like [`start_capture_server`] but each request stalls before responding,
/// for asserting that acknowledgments do not wait on delivery.
pub async fn start_slow_capture_server(delay: Duration) -> (String, mpsc::UnboundedReceiver<Value>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let app = Router::new().route(
        "/collect",
        post(move |Json(body): Json<Value>| {
            let tx = tx.clone();
            async move {
                tokio::time::sleep(delay).await;
                let _ = tx.send(body);
                "ok"
            }
        }),
    );
    let base = serve_app(app).await;
    (format!("{base}/collect"), rx)
}

/// An address nothing listens on (bound, then released).
pub async fn unreachable_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
