//! Run Configuration
//!
//! A [`RunConfig`] is assembled from command-line flags, then merged with the
//! environment and validated before anything is loaded or dispatched.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Command-line flags
//! 2. Environment variables (`OPENAI_API_KEY`, `HF_TOKEN`), including `.env`
//! 3. Defaults

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::dataset::DatasetSource;
use crate::error::{BatchError, Result};
use crate::runtime::InferSettings;
use crate::template::TemplatePreset;
use crate::util::{DEFAULT_BASE_URL, DEFAULT_HUB_URL, INFER_TIMEOUT};

/// Environment variables checked for the hub token, in order
const HUB_TOKEN_VARS: [&str; 2] = ["HF_TOKEN", "HUGGING_FACE_HUB_TOKEN"];

/// Everything one batch run needs
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub model: String,
    /// Local path or hub dataset name
    pub dataset: String,
    pub split: String,
    pub subset: String,
    /// OpenAI-compatible API root
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Upper bound on simultaneous in-flight requests
    pub max_concurrent: usize,
    pub instruction_template: Option<String>,
    pub template_preset: Option<TemplatePreset>,
    pub output: PathBuf,
    /// Per-request transport timeout
    pub request_timeout: Duration,
    pub hub_url: String,
    /// Bearer token for the inference server
    pub api_key: Option<String>,
    /// Bearer token for the dataset-server
    pub hub_token: Option<String>,
}

impl RunConfig {
    /// Create a config with every optional setting at its default
    pub fn new(model: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            dataset: dataset.into(),
            split: "test".to_string(),
            subset: "main".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.7,
            max_tokens: 512,
            max_concurrent: 100,
            instruction_template: None,
            template_preset: None,
            output: PathBuf::from("predictions.json"),
            request_timeout: INFER_TIMEOUT,
            hub_url: DEFAULT_HUB_URL.to_string(),
            api_key: None,
            hub_token: None,
        }
    }

    /// Fill unset secrets from environment variables
    ///
    /// Empty variables are ignored.
    pub fn with_env(mut self) -> Self {
        if self.api_key.is_none() {
            self.api_key = non_empty_var("OPENAI_API_KEY");
        }
        if self.hub_token.is_none() {
            self.hub_token = HUB_TOKEN_VARS.iter().find_map(|var| non_empty_var(var));
        }
        self
    }

    /// Reject settings that cannot produce a meaningful run
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(BatchError::InvalidConfig { message });

        if self.model.trim().is_empty() {
            return invalid("--model must not be empty".to_string());
        }
        if self.dataset.trim().is_empty() {
            return invalid("--dataset must not be empty".to_string());
        }
        if self.max_concurrent == 0 {
            return invalid("--max_concurrent must be at least 1".to_string());
        }
        if self.max_concurrent > Semaphore::MAX_PERMITS {
            return invalid(format!(
                "--max_concurrent must be at most {}",
                Semaphore::MAX_PERMITS
            ));
        }
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return invalid(format!(
                "--temperature must be a non-negative number, got {}",
                self.temperature
            ));
        }
        if self.max_tokens == 0 {
            return invalid("--max_tokens must be at least 1".to_string());
        }
        if self.request_timeout.is_zero() {
            return invalid("--request_timeout must be at least 1 second".to_string());
        }

        url::Url::parse(&self.base_url).map_err(|e| BatchError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;

        Ok(())
    }

    /// Where the records come from
    pub fn dataset_source(&self) -> DatasetSource {
        DatasetSource {
            dataset: self.dataset.clone(),
            subset: self.subset.clone(),
            split: self.split.clone(),
            hub_url: self.hub_url.clone(),
            hub_token: self.hub_token.clone(),
        }
    }

    /// Sampling settings shared by every request of the run
    pub fn infer_settings(&self) -> InferSettings {
        InferSettings {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

/// Mask an API key for display (e.g., "sk-proj-abc..." → "sk-proj***")
pub fn mask_api_key(key: &str, visible_chars: usize) -> String {
    if key.is_empty() {
        return String::new();
    }

    let visible = key
        .char_indices()
        .nth(visible_chars)
        .map_or(key.len(), |(idx, _)| idx);
    format!("{}***", &key[..visible])
}
