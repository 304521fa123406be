//! Chain processor: ordered composition with short-circuit.

use std::sync::Arc;

use serde_json::Value;

use crate::processor::{ProcessError, Processor};

/// Runs stages in order, feeding each stage the previous stage's output.
/// The first failure stops the chain and reports the failing stage's index
/// and name; later stages are never invoked.
#[derive(Debug)]
pub struct ChainProcessor {
    stages: Vec<Arc<dyn Processor>>,
}

impl ChainProcessor {
    pub fn new(stages: Vec<Arc<dyn Processor>>) -> Self {
        Self { stages }
    }
}

impl Processor for ChainProcessor {
    fn name(&self) -> &str {
        "chain"
    }

    fn process(&self, payload: &Value, request_id: &str) -> Result<Value, ProcessError> {
        let mut current = payload.clone();
        for (index, stage) in self.stages.iter().enumerate() {
            match stage.process(&current, request_id) {
                Ok(next) => current = next,
                Err(source) => {
                    return Err(ProcessError::Stage {
                        index,
                        stage: stage.name().to_string(),
                        source: Box::new(source),
                    });
                }
            }
        }
        Ok(current)
    }
}
