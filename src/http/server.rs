//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the callback and webhook handlers
//! - Wire up middleware (tracing, request timeout, body limits)
//! - Track the advertised base URL and running flag for the orchestrator
//! - Serve with graceful shutdown

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};
use url::Url;

use crate::config::RelayConfig;
use crate::correlation::CorrelationRegistry;
use crate::http::{callback, webhook, CALLBACK_PATH, WEBHOOK_PATH};
use crate::lifecycle::Shutdown;
use crate::processor::Processor;
use crate::transport::TransportSelector;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<CorrelationRegistry>,
    pub processor: Option<Arc<dyn Processor>>,
    pub transport: Arc<TransportSelector>,
    pub shutdown: Shutdown,
}

/// Shared view of the server's run state, consulted by the orchestrator for
/// its preconditions and the callback URL.
#[derive(Clone, Default)]
pub struct ServerHandle {
    inner: Arc<HandleInner>,
}

#[derive(Default)]
struct HandleInner {
    running: AtomicBool,
    base_url: RwLock<Option<Url>>,
}

impl ServerHandle {
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Advertised base URL, set once the server has bound.
    pub fn base_url(&self) -> Option<Url> {
        self.inner
            .base_url
            .read()
            .expect("server handle poisoned")
            .clone()
    }

    /// Absolute URL of the callback endpoint, `None` until the server runs.
    pub fn callback_url(&self) -> Option<Url> {
        if !self.is_running() {
            return None;
        }
        self.base_url().and_then(|base| base.join(CALLBACK_PATH).ok())
    }

    fn mark_started(&self, base: Url) {
        *self
            .inner
            .base_url
            .write()
            .expect("server handle poisoned") = Some(base);
        self.inner.running.store(true, Ordering::Release);
    }

    fn mark_stopped(&self) {
        self.inner.running.store(false, Ordering::Release);
    }
}

/// HTTP server for the relay node.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
    handle: ServerHandle,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and shared
    /// subsystems.
    pub fn new(
        config: RelayConfig,
        registry: Arc<CorrelationRegistry>,
        processor: Option<Arc<dyn Processor>>,
        transport: Arc<TransportSelector>,
        shutdown: Shutdown,
    ) -> Self {
        let state = AppState {
            registry,
            processor,
            transport,
            shutdown,
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            handle: ServerHandle::default(),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/", get(info_handler))
            .route(CALLBACK_PATH, post(callback::deliver_callback));

        if config.webhook.enabled {
            router = router.route(WEBHOOK_PATH, post(webhook::accept_webhook));
        }

        router
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
            .layer(TraceLayer::new_for_http())
    }

    /// Handle for precondition checks and the advertised callback URL.
    pub fn handle(&self) -> ServerHandle {
        self.handle.clone()
    }

    /// Run the server, accepting connections on the given listener, until
    /// the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;

        let base = match &self.config.listener.public_url {
            Some(url) => match Url::parse(url) {
                Ok(url) => url,
                Err(e) => {
                    tracing::error!(public_url = %url, error = %e, "Invalid public_url, advertising bound address");
                    bound_base_url(addr)?
                }
            },
            None => bound_base_url(addr)?,
        };

        tracing::info!(
            address = %addr,
            base_url = %base,
            "HTTP server starting"
        );
        self.handle.mark_started(base);

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await;

        self.handle.mark_stopped();
        tracing::info!("HTTP server stopped");
        result
    }
}

fn bound_base_url(addr: SocketAddr) -> Result<Url, std::io::Error> {
    Url::parse(&format!("http://{addr}"))
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
}

/// Server info, not part of the round-trip contract.
async fn info_handler(State(_state): State<AppState>) -> String {
    format!(
        "webhook-relay v{}\nendpoints: POST {}, POST {}\n",
        env!("CARGO_PKG_VERSION"),
        CALLBACK_PATH,
        WEBHOOK_PATH,
    )
}
