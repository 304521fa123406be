//! Webhook round-trip relay library.
//!
//! A relay node runs a local HTTP server, POSTs payload envelopes to a
//! remote peer, and resolves each round trip when the peer calls back into
//! the node's own `/roundtrip` endpoint with a correlated response.
//!
//! ```text
//! RoundTripClient ──POST envelope──▶ remote peer (its /webhook)
//!        │                              │ processing
//!        ▼ wait on registry             ▼
//! CorrelationRegistry ◀──deliver── POST /roundtrip (callback)
//! ```

// Round-trip core
pub mod client;
pub mod correlation;
pub mod http;
pub mod transport;

// Webhook processing path
pub mod processor;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use client::{CallbackBody, Envelope, RoundTripClient, RoundTripOptions, RoundTripResult};
pub use config::RelayConfig;
pub use correlation::{CorrelationRegistry, DeliverOutcome};
pub use http::{HttpServer, ServerHandle};
pub use lifecycle::Shutdown;
pub use transport::{SecureTransport, TransportSelector};
