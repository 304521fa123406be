//! Counting processor: stateful sequence numbering.

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

use crate::processor::{ProcessError, Processor};

/// Stamps object payloads with a process-local sequence number. The counter
/// is atomic, so concurrent webhook requests each get a distinct number.
#[derive(Debug, Default)]
pub struct CountingProcessor {
    seen: AtomicU64,
}

impl CountingProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of payloads processed so far.
    pub fn count(&self) -> u64 {
        self.seen.load(Ordering::Relaxed)
    }
}

impl Processor for CountingProcessor {
    fn name(&self) -> &str {
        "count"
    }

    fn process(&self, payload: &Value, _request_id: &str) -> Result<Value, ProcessError> {
        let sequence = self.seen.fetch_add(1, Ordering::Relaxed) + 1;
        let mut out = payload.clone();
        if let Some(map) = out.as_object_mut() {
            map.insert("sequence".to_string(), Value::from(sequence));
        }
        Ok(out)
    }
}
