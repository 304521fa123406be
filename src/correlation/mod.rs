//! Round-trip correlation subsystem.

pub mod registry;

pub use registry::{CorrelationRegistry, DeliverOutcome, DuplicateRequestId};
