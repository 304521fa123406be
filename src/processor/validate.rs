//! Validator processor: required top-level fields.

use serde_json::Value;

use crate::processor::{ProcessError, Processor};

/// Rejects payloads that are not JSON objects or that lack any of the
/// required top-level fields. Valid payloads pass through unchanged.
#[derive(Debug)]
pub struct ValidateProcessor {
    required: Vec<String>,
}

impl ValidateProcessor {
    pub fn new(required: Vec<String>) -> Self {
        Self { required }
    }
}

impl Processor for ValidateProcessor {
    fn name(&self) -> &str {
        "validate"
    }

    fn process(&self, payload: &Value, _request_id: &str) -> Result<Value, ProcessError> {
        let map = payload
            .as_object()
            .ok_or_else(|| ProcessError::InvalidPayload("payload is not an object".into()))?;

        for field in &self.required {
            if !map.contains_key(field) {
                return Err(ProcessError::InvalidPayload(format!(
                    "missing required field `{field}`"
                )));
            }
        }
        Ok(payload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_complete_payload() {
        let validator = ValidateProcessor::new(vec!["name".into()]);
        let payload = json!({"name": "ada"});
        assert_eq!(validator.process(&payload, "r1").unwrap(), payload);
    }

    #[test]
    fn test_rejects_missing_field() {
        let validator = ValidateProcessor::new(vec!["name".into()]);
        let err = validator.process(&json!({"a": 1}), "r1").unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_rejects_non_object() {
        let validator = ValidateProcessor::new(vec!["name".into()]);
        assert!(validator.process(&json!([1, 2]), "r1").is_err());
    }
}
