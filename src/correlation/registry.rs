//! Request correlation registry.
//!
//! Maps in-flight request IDs to single-slot delivery channels. The map is
//! the only mutable shared state in the round-trip core and is guarded by a
//! single mutex; the oneshot channel does the actual cross-task handoff, so
//! the lock is only held for map mutation, never while waiting.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;
use tokio::sync::oneshot;

use crate::client::types::CallbackBody;

/// Outcome of attempting to deliver a callback to a waiting round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliverOutcome {
    /// Exactly one waiter was unblocked with this callback.
    Delivered,
    /// No entry for this request ID (never registered, or already cleaned up).
    NotFound,
    /// Entry exists but was already resolved, or the waiter gave up.
    Gone,
}

/// Returned by [`CorrelationRegistry::register`] when the request ID is
/// already in flight.
#[derive(Debug, Error)]
#[error("request id `{0}` is already registered")]
pub struct DuplicateRequestId(pub String);

/// A registered entry. `Resolved` keeps the key occupied after a successful
/// delivery so duplicate callbacks are distinguishable from unknown ones
/// until the orchestrator releases the entry.
enum Slot {
    Waiting(oneshot::Sender<CallbackBody>),
    Resolved,
}

/// Thread-safe map from request ID to delivery channel.
#[derive(Default)]
pub struct CorrelationRegistry {
    pending: Mutex<HashMap<String, Slot>>,
}

impl CorrelationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a delivery channel for `request_id` and store its sending half.
    ///
    /// Fails if the ID is already in flight. IDs are UUIDs in practice, so a
    /// collision means the caller reused an explicit ID concurrently.
    pub fn register(
        &self,
        request_id: &str,
    ) -> Result<oneshot::Receiver<CallbackBody>, DuplicateRequestId> {
        let mut pending = self.pending.lock().expect("correlation map poisoned");
        match pending.entry(request_id.to_string()) {
            Entry::Occupied(_) => Err(DuplicateRequestId(request_id.to_string())),
            Entry::Vacant(slot) => {
                let (tx, rx) = oneshot::channel();
                slot.insert(Slot::Waiting(tx));
                Ok(rx)
            }
        }
    }

    /// Hand `body` to the round trip waiting on `request_id`, at most once.
    pub fn deliver(&self, request_id: &str, body: CallbackBody) -> DeliverOutcome {
        let mut pending = self.pending.lock().expect("correlation map poisoned");
        let slot = match pending.get_mut(request_id) {
            Some(slot) => slot,
            None => return DeliverOutcome::NotFound,
        };
        match std::mem::replace(slot, Slot::Resolved) {
            // send() is non-blocking; it only fails if the receiver was
            // dropped, i.e. the waiter already timed out.
            Slot::Waiting(tx) => match tx.send(body) {
                Ok(()) => DeliverOutcome::Delivered,
                Err(_) => DeliverOutcome::Gone,
            },
            Slot::Resolved => DeliverOutcome::Gone,
        }
    }

    /// Remove the entry for `request_id`, closing its channel if still open.
    ///
    /// Called by the orchestrator on every exit path; the entry's lifetime is
    /// bounded exactly to one round-trip call.
    pub fn unregister(&self, request_id: &str) {
        let mut pending = self.pending.lock().expect("correlation map poisoned");
        pending.remove(request_id);
    }

    /// Number of entries currently held (waiting or resolved).
    pub fn len(&self) -> usize {
        self.pending.lock().expect("correlation map poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(request_id: &str) -> CallbackBody {
        CallbackBody {
            request_id: request_id.to_string(),
            payload: json!({"ok": true}),
            error: None,
            failed_stage: None,
            secure_key: None,
        }
    }

    #[tokio::test]
    async fn test_deliver_unblocks_receiver() {
        let registry = CorrelationRegistry::new();
        let rx = registry.register("r1").unwrap();

        assert_eq!(registry.deliver("r1", body("r1")), DeliverOutcome::Delivered);
        let received = rx.await.unwrap();
        assert_eq!(received.payload, json!({"ok": true}));
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let registry = CorrelationRegistry::new();
        assert_eq!(registry.deliver("nope", body("nope")), DeliverOutcome::NotFound);
    }

    #[test]
    fn test_second_delivery_is_gone() {
        let registry = CorrelationRegistry::new();
        let _rx = registry.register("r1").unwrap();

        assert_eq!(registry.deliver("r1", body("r1")), DeliverOutcome::Delivered);
        assert_eq!(registry.deliver("r1", body("r1")), DeliverOutcome::Gone);
        // Entry stays occupied until the orchestrator releases it.
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_delivery_after_receiver_dropped_is_gone() {
        let registry = CorrelationRegistry::new();
        let rx = registry.register("r1").unwrap();
        drop(rx); // waiter timed out

        assert_eq!(registry.deliver("r1", body("r1")), DeliverOutcome::Gone);
    }

    #[test]
    fn test_unregister_makes_id_unknown() {
        let registry = CorrelationRegistry::new();
        let _rx = registry.register("r1").unwrap();
        registry.unregister("r1");

        assert_eq!(registry.deliver("r1", body("r1")), DeliverOutcome::NotFound);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_register_rejected() {
        let registry = CorrelationRegistry::new();
        let _rx = registry.register("r1").unwrap();

        let err = registry.register("r1").unwrap_err();
        assert_eq!(err.0, "r1");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_concurrent_deliveries_exactly_one_wins() {
        use std::sync::Arc;

        let registry = Arc::new(CorrelationRegistry::new());
        let _rx = registry.register("r1").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.deliver("r1", body("r1")))
            })
            .collect();

        let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let delivered = outcomes
            .iter()
            .filter(|o| **o == DeliverOutcome::Delivered)
            .count();
        let gone = outcomes
            .iter()
            .filter(|o| **o == DeliverOutcome::Gone)
            .count();
        assert_eq!(delivered, 1);
        assert_eq!(gone, 7);
    }
}
