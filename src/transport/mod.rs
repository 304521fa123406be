//! Outbound transport subsystem.

pub mod selector;

pub use selector::{ProxySecureTransport, SecureTransport, TransportError, TransportSelector};
