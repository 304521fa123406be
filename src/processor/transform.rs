//! Transform processor: recursive string uppercasing.

use serde_json::Value;

use crate::processor::{ProcessError, Processor};

/// Uppercases every string value in the payload, recursing through arrays
/// and objects. Keys are left alone.
#[derive(Debug, Default)]
pub struct TransformProcessor;

impl TransformProcessor {
    pub fn new() -> Self {
        Self
    }
}

fn uppercase_strings(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.to_uppercase()),
        Value::Array(items) => Value::Array(items.iter().map(uppercase_strings).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), uppercase_strings(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

impl Processor for TransformProcessor {
    fn name(&self) -> &str {
        "transform"
    }

    fn process(&self, payload: &Value, _request_id: &str) -> Result<Value, ProcessError> {
        Ok(uppercase_strings(payload))
    }
}
