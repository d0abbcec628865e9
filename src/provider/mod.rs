//! # Provider Abstraction Layer
//!
//! The provider is the transport behind the Request Executor: it performs
//! exactly one inference call per [`Provider::infer`] and reports failures as
//! typed [`BatchError`](crate::error::BatchError)s. Providers never retry.
//!
//! | Provider | Use Case |
//! |----------|----------|
//! | [`OpenAIProvider`] | Any OpenAI-compatible `/v1/chat/completions` server (vLLM, TGI, OpenAI) |
//! | [`MockProvider`] | Tests and benchmarks: scripted responses, failures, latency |

mod mock;
mod openai;

pub use mock::MockProvider;
pub use openai::OpenAIProvider;

use async_trait::async_trait;

use crate::error::Result;

/// One inference call
#[derive(Debug, Clone, PartialEq)]
pub struct InferRequest {
    /// Rendered prompt, sent as a single user message
    pub prompt: String,
    /// Model identifier understood by the server
    pub model: String,
    pub temperature: f32,
    /// Maximum output tokens
    pub max_tokens: u32,
}

impl InferRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            temperature: 0.7,
            max_tokens: 512,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// LLM inference backend
///
/// Implementations must be cheap to share across tasks (`Arc<dyn Provider>`).
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name for logs (e.g., "openai", "mock")
    fn name(&self) -> &str;

    /// Execute one request and return the generated text.
    ///
    /// `Ok(None)` means the server answered but the message had no content.
    async fn infer(&self, request: &InferRequest) -> Result<Option<String>>;
}
