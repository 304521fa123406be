//! Local HTTP surface.
//!
//! # Data Flow
//! ```text
//! remote peer POST /roundtrip
//!     → callback.rs (parse, deliver to correlation registry)
//!     → waiting round trip unblocks
//!
//! remote peer POST /webhook
//!     → webhook.rs (parse, ack 200)
//!     → background task: processor → POST result to callback URL
//! ```

pub mod callback;
pub mod server;
pub mod webhook;

/// Path of the callback delivery endpoint.
pub const CALLBACK_PATH: &str = "/roundtrip";

/// Path of the webhook processing endpoint.
pub const WEBHOOK_PATH: &str = "/webhook";

pub use server::{AppState, HttpServer, ServerHandle};
