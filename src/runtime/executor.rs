//! Request Executor - one inference call per task
//!
//! Issues exactly one provider call and converts every failure (connection,
//! timeout, service error, malformed response) into a failure outcome carrying
//! the task's index. Nothing escapes as an error.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::provider::{InferRequest, Provider};
use crate::store::Outcome;

use super::task::{Task, TaskState};

/// Sampling settings shared by every request of a run
#[derive(Debug, Clone, PartialEq)]
pub struct InferSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl InferSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.7,
            max_tokens: 512,
        }
    }

    /// Request for one prompt
    pub fn request(&self, prompt: &str) -> InferRequest {
        InferRequest::new(prompt, self.model.clone())
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
    }
}

/// Executes admitted tasks against a provider
#[derive(Clone)]
pub struct RequestExecutor {
    provider: Arc<dyn Provider>,
    settings: Arc<InferSettings>,
}

impl RequestExecutor {
    pub fn new(provider: Arc<dyn Provider>, settings: InferSettings) -> Self {
        Self {
            provider,
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &InferSettings {
        &self.settings
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Run one admitted task to a terminal outcome
    #[instrument(skip_all, fields(idx = task.index()))]
    pub async fn execute(&self, mut task: Task) -> Outcome {
        task.advance(TaskState::InFlight);
        let request = self.settings.request(task.prompt());

        match self.provider.infer(&request).await {
            Ok(response) => {
                match &response {
                    Some(text) => debug!(response_len = text.len(), "Inference succeeded"),
                    None => debug!("Inference succeeded without message content"),
                }
                task.succeed(response)
            }
            Err(e) => task.fail(e),
        }
    }
}
