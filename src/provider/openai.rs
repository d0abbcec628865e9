//! OpenAI-compatible provider
//!
//! Executes prompts via `POST {base_url}/chat/completions`. Works against vLLM,
//! TGI and the OpenAI API itself. The bearer token is optional: local servers
//! accept any value.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{InferRequest, Provider};
use crate::error::{BatchError, Result};
use crate::util::{truncate_body, CONNECT_TIMEOUT, PLACEHOLDER_API_KEY, USER_AGENT};

/// Provider for OpenAI-compatible chat completion servers
pub struct OpenAIProvider {
    /// HTTP client (connection pooling shared across tasks)
    client: Client,
    /// Full chat completions URL
    endpoint: String,
    api_key: String,
    /// Per-request timeout, reported in timeout errors
    timeout: Duration,
}

impl OpenAIProvider {
    /// Create a provider for `base_url` (e.g. `http://localhost:8000/v1`)
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let endpoint = chat_completions_url(base_url)?;

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| BatchError::InvalidConfig {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.unwrap_or_else(|| PLACEHOLDER_API_KEY.to_string()),
            timeout,
        })
    }

    /// The URL requests are sent to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn classify(&self, err: reqwest::Error) -> BatchError {
        if err.is_timeout() {
            BatchError::Timeout {
                timeout: self.timeout,
            }
        } else if err.is_connect() {
            BatchError::Connection {
                message: error_chain(&err),
            }
        } else {
            BatchError::Network {
                message: error_chain(&err),
            }
        }
    }
}

#[async_trait]
impl Provider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn infer(&self, request: &InferRequest) -> Result<Option<String>> {
        let payload = ChatCompletionRequest {
            model: &request.model,
            messages: [ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        tracing::debug!(
            provider = "openai",
            model = %request.model,
            prompt_len = request.prompt.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            return Err(BatchError::Service {
                status: status.as_u16(),
                body: truncate_body(&body).into_owned(),
            });
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_str(&body).map_err(|e| BatchError::MalformedResponse {
                details: e.to_string(),
            })?;

        if let Some(usage) = &parsed.usage {
            tracing::debug!(
                provider = "openai",
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Chat completion received"
            );
        }

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| BatchError::MalformedResponse {
                details: "response has no choices".to_string(),
            })?;
        Ok(choice.message.content)
    }
}

/// Join `base_url` and `chat/completions`, validating the URL
fn chat_completions_url(base_url: &str) -> Result<String> {
    let parsed = Url::parse(base_url).map_err(|e| BatchError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(BatchError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    Ok(format!("{}/chat/completions", base_url.trim_end_matches('/')))
}

/// Display an error with its full source chain
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

// ============================================================================
// API TYPES
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: u32,
    completion_tokens: u32,
}

// ============================================================================
// TESTS
// ============================================================================
