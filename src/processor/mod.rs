//! Pluggable payload processors for the webhook endpoint.
//!
//! A processor is a pure transform over JSON payloads; stateful
//! implementations synchronize internally. Composition is explicit via
//! [`ChainProcessor`], which short-circuits on the first failing stage.

pub mod chain;
pub mod count;
pub mod echo;
pub mod transform;
pub mod validate;

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::config::WebhookConfig;

pub use chain::ChainProcessor;
pub use count::CountingProcessor;
pub use echo::EchoProcessor;
pub use transform::TransformProcessor;
pub use validate::ValidateProcessor;

/// Processor names accepted in `webhook.processors` config.
pub const KNOWN_PROCESSORS: &[&str] = &["echo", "transform", "validate", "count"];

/// Errors produced while processing a webhook payload.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("stage {index} ({stage}) failed: {source}")]
    Stage {
        index: usize,
        stage: String,
        #[source]
        source: Box<ProcessError>,
    },

    #[error("{0}")]
    Failed(String),
}

impl ProcessError {
    /// Index of the failing chain stage, when the failure came from a chain.
    pub fn failed_stage(&self) -> Option<usize> {
        match self {
            ProcessError::Stage { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// A payload transform applied to inbound webhook requests.
pub trait Processor: Send + Sync + std::fmt::Debug {
    /// Short identifier used in logs and chain error reports.
    fn name(&self) -> &str;

    fn process(&self, payload: &Value, request_id: &str) -> Result<Value, ProcessError>;
}

/// Returned by [`build_processor`] for names outside [`KNOWN_PROCESSORS`].
#[derive(Debug, Error)]
#[error("unknown processor `{0}`")]
pub struct UnknownProcessor(pub String);

/// Build the configured processor. `None` means identity: the webhook
/// endpoint echoes payloads back unchanged.
pub fn build_processor(
    config: &WebhookConfig,
) -> Result<Option<Arc<dyn Processor>>, UnknownProcessor> {
    let mut stages: Vec<Arc<dyn Processor>> = Vec::with_capacity(config.processors.len());
    for name in &config.processors {
        let stage: Arc<dyn Processor> = match name.as_str() {
            "echo" => Arc::new(EchoProcessor::new()),
            "transform" => Arc::new(TransformProcessor::new()),
            "validate" => Arc::new(ValidateProcessor::new(config.required_fields.clone())),
            "count" => Arc::new(CountingProcessor::new()),
            other => return Err(UnknownProcessor(other.to_string())),
        };
        stages.push(stage);
    }

    Ok(match stages.len() {
        0 => None,
        1 => stages.pop(),
        _ => Some(Arc::new(ChainProcessor::new(stages))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_builds_identity() {
        let config = WebhookConfig::default();
        assert!(build_processor(&config).unwrap().is_none());
    }

    #[test]
    fn test_single_stage_is_not_wrapped_in_chain() {
        let config = WebhookConfig {
            processors: vec!["echo".into()],
            ..WebhookConfig::default()
        };
        let processor = build_processor(&config).unwrap().unwrap();
        assert_eq!(processor.name(), "echo");
    }

    #[test]
    fn test_multiple_stages_build_a_chain() {
        let config = WebhookConfig {
            processors: vec!["validate".into(), "transform".into(), "count".into()],
            required_fields: vec!["name".into()],
            ..WebhookConfig::default()
        };
        let processor = build_processor(&config).unwrap().unwrap();
        assert_eq!(processor.name(), "chain");
    }

    #[test]
    fn test_unknown_name_rejected() {
        let config = WebhookConfig {
            processors: vec!["frobnicate".into()],
            ..WebhookConfig::default()
        };
        let err = build_processor(&config).unwrap_err();
        assert_eq!(err.0, "frobnicate");
    }
}
