//! Round-trip client subsystem: orchestrator and wire types.

pub mod roundtrip;
pub mod types;

pub use roundtrip::RoundTripClient;
pub use types::{CallbackBody, Envelope, RoundTripOptions, RoundTripResult};
