//! Echo processor: returns the payload, annotated.

use serde_json::Value;

use crate::processor::{ProcessError, Processor};

/// Returns the payload unchanged apart from a `processed_by` marker on
/// object payloads. Non-object payloads pass through untouched.
#[derive(Debug, Default)]
pub struct EchoProcessor;

impl EchoProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Processor for EchoProcessor {
    fn name(&self) -> &str {
        "echo"
    }

    fn process(&self, payload: &Value, _request_id: &str) -> Result<Value, ProcessError> {
        let mut out = payload.clone();
        if let Some(map) = out.as_object_mut() {
            map.insert("processed_by".to_string(), Value::from("echo"));
        }
        Ok(out)
    }
}
