//! Configuration subsystem.
//!
//! Explicit config structs passed into constructors; no ambient globals.
//! Schema is serde-driven, loading is TOML, and semantic validation runs
//! before a config is accepted.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    DestinationConfig, ListenerConfig, ObservabilityConfig, RelayConfig, TimeoutConfig,
    TransportConfig, WebhookConfig,
};
pub use validation::{validate_config, ValidationError};
