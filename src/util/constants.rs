//! Centralized constants for runtime configuration
//!
//! All timeout and limit values in one place for easy tuning.

use std::time::Duration;

// ═══════════════════════════════════════════════════════════════
// HTTP Timeouts
// ═══════════════════════════════════════════════════════════════

/// Default per-request timeout for inference calls
pub const INFER_TIMEOUT: Duration = Duration::from_secs(120);

/// Timeout for dataset-server page requests
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for establishing HTTP connections
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ═══════════════════════════════════════════════════════════════
// Defaults
// ═══════════════════════════════════════════════════════════════

/// Default OpenAI-compatible endpoint (local vLLM server)
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/v1";

/// Default Hugging Face dataset-server
pub const DEFAULT_HUB_URL: &str = "https://datasets-server.huggingface.co";

/// Bearer token sent when no API key is configured (vLLM ignores it)
pub const PLACEHOLDER_API_KEY: &str = "not-needed";

/// User agent for all outbound requests
pub const USER_AGENT: &str = concat!("batch-infer/", env!("CARGO_PKG_VERSION"));

// ═══════════════════════════════════════════════════════════════
// Limits
// ═══════════════════════════════════════════════════════════════

/// Maximum rows the dataset-server returns per page
pub const HUB_PAGE_SIZE: usize = 100;

/// Maximum number of characters of an error body kept in a failure message
pub const ERROR_BODY_LIMIT: usize = 512;

// ═══════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════
