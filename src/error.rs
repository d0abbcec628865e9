//! Batch Error Types with Error Codes
//!
//! Error code ranges:
//! - BATCH-000-009: Configuration errors
//! - BATCH-010-019: Template errors
//! - BATCH-020-029: Dataset errors
//! - BATCH-030-039: Transport/provider errors
//! - BATCH-040-049: Runtime errors
//! - BATCH-050-059: Aggregation invariant errors
//! - BATCH-060-069: Output errors
//!
//! Task-level errors (template field lookup, transport) never abort a run: the
//! dispatcher turns them into failure outcomes. Everything else is fatal.

use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BatchError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// All error variants are part of the public API.
///
/// Implements both `thiserror::Error` for std error compatibility
/// and `miette::Diagnostic` for fancy terminal error display.
#[derive(Error, Debug, Diagnostic)]
pub enum BatchError {
    // ═══════════════════════════════════════════
    // CONFIGURATION ERRORS (000-009)
    // ═══════════════════════════════════════════
    #[error("[BATCH-001] Invalid configuration: {message}")]
    #[diagnostic(code(batch::invalid_config), help("Check the command-line flags"))]
    InvalidConfig { message: String },

    #[error("[BATCH-002] Invalid base URL '{url}': {reason}")]
    #[diagnostic(
        code(batch::invalid_base_url),
        help("Use a full URL such as http://localhost:8000/v1")
    )]
    InvalidBaseUrl { url: String, reason: String },

    // ═══════════════════════════════════════════
    // TEMPLATE ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[BATCH-010] Template parse error at position {position}: {details}")]
    #[diagnostic(
        code(batch::template_parse),
        help("Use {{field}} placeholders and double braces for literal braces")
    )]
    TemplateParse { position: usize, details: String },

    #[error("[BATCH-011] Template field '{field}' is missing from the record")]
    #[diagnostic(code(batch::template_field_missing))]
    TemplateFieldMissing { field: String },

    // ═══════════════════════════════════════════
    // DATASET ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[BATCH-020] Dataset not found: {dataset}")]
    #[diagnostic(code(batch::dataset_not_found))]
    DatasetNotFound { dataset: String },

    #[error("[BATCH-021] Failed to load dataset '{dataset}': {reason}")]
    #[diagnostic(code(batch::dataset_load))]
    DatasetLoad { dataset: String, reason: String },

    #[error("[BATCH-022] Record {index} is invalid: {reason}")]
    #[diagnostic(code(batch::invalid_record))]
    InvalidRecord { index: usize, reason: String },

    // ═══════════════════════════════════════════
    // TRANSPORT ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[BATCH-030] Connection failed: {message}")]
    #[diagnostic(code(batch::connection))]
    Connection { message: String },

    #[error("[BATCH-031] Request timed out after {timeout:?}")]
    #[diagnostic(code(batch::timeout))]
    Timeout { timeout: Duration },

    #[error("[BATCH-032] Network error: {message}")]
    #[diagnostic(code(batch::network))]
    Network { message: String },

    #[error("[BATCH-033] Service returned {status}: {body}")]
    #[diagnostic(code(batch::service))]
    Service { status: u16, body: String },

    #[error("[BATCH-034] Malformed response: {details}")]
    #[diagnostic(code(batch::malformed_response))]
    MalformedResponse { details: String },

    // ═══════════════════════════════════════════
    // RUNTIME ERRORS (040-049)
    // ═══════════════════════════════════════════
    #[error("[BATCH-040] Concurrency limiter was closed")]
    #[diagnostic(code(batch::limiter_closed))]
    LimiterClosed,

    #[error("[BATCH-041] Task for record {index} panicked: {message}")]
    #[diagnostic(code(batch::task_panicked))]
    TaskPanicked { index: usize, message: String },

    // ═══════════════════════════════════════════
    // AGGREGATION ERRORS (050-059)
    // ═══════════════════════════════════════════
    #[error("[BATCH-050] Outcome for record {index} was recorded twice")]
    #[diagnostic(code(batch::duplicate_outcome))]
    DuplicateOutcome { index: usize },

    #[error("[BATCH-051] Outcome index {index} is outside the result set (len {len})")]
    #[diagnostic(code(batch::outcome_out_of_range))]
    OutcomeOutOfRange { index: usize, len: usize },

    #[error("[BATCH-052] No outcome was recorded for record {index}")]
    #[diagnostic(code(batch::missing_outcome))]
    MissingOutcome { index: usize },

    // ═══════════════════════════════════════════
    // OUTPUT ERRORS (060-069)
    // ═══════════════════════════════════════════
    #[error("[BATCH-060] Failed to serialize results: {details}")]
    #[diagnostic(code(batch::serialization))]
    Serialization { details: String },

    #[error("[BATCH-061] Failed to write '{path}': {reason}")]
    #[diagnostic(code(batch::output_write))]
    OutputWrite { path: String, reason: String },
}

impl BatchError {
    /// Get the error code (e.g., "BATCH-001")
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "BATCH-001",
            Self::InvalidBaseUrl { .. } => "BATCH-002",
            Self::TemplateParse { .. } => "BATCH-010",
            Self::TemplateFieldMissing { .. } => "BATCH-011",
            Self::DatasetNotFound { .. } => "BATCH-020",
            Self::DatasetLoad { .. } => "BATCH-021",
            Self::InvalidRecord { .. } => "BATCH-022",
            Self::Connection { .. } => "BATCH-030",
            Self::Timeout { .. } => "BATCH-031",
            Self::Network { .. } => "BATCH-032",
            Self::Service { .. } => "BATCH-033",
            Self::MalformedResponse { .. } => "BATCH-034",
            Self::LimiterClosed => "BATCH-040",
            Self::TaskPanicked { .. } => "BATCH-041",
            Self::DuplicateOutcome { .. } => "BATCH-050",
            Self::OutcomeOutOfRange { .. } => "BATCH-051",
            Self::MissingOutcome { .. } => "BATCH-052",
            Self::Serialization { .. } => "BATCH-060",
            Self::OutputWrite { .. } => "BATCH-061",
        }
    }

    /// Whether this error aborts the whole run.
    ///
    /// Task-level errors are captured as failure outcomes instead.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::TemplateFieldMissing { .. }
                | Self::Connection { .. }
                | Self::Timeout { .. }
                | Self::Network { .. }
                | Self::Service { .. }
                | Self::MalformedResponse { .. }
                | Self::LimiterClosed
                | Self::TaskPanicked { .. }
        )
    }
}

impl From<serde_json::Error> for BatchError {
    fn from(e: serde_json::Error) -> Self {
        BatchError::Serialization {
            details: e.to_string(),
        }
    }
}

impl FixSuggestion for BatchError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            BatchError::InvalidConfig { .. } => Some("Check the command-line flags (see --help)"),
            BatchError::InvalidBaseUrl { .. } => {
                Some("Use a full URL such as http://localhost:8000/v1")
            }
            BatchError::TemplateParse { .. } => {
                Some("Use {field} placeholders; write {{ and }} for literal braces")
            }
            BatchError::TemplateFieldMissing { .. } => {
                Some("Check the template placeholders against the dataset columns")
            }
            BatchError::DatasetNotFound { .. } => {
                Some("Pass an existing .json/.jsonl file or a valid hub dataset name")
            }
            BatchError::DatasetLoad { .. } => {
                Some("Check --dataset, --subset and --split, and HF_TOKEN for gated datasets")
            }
            BatchError::InvalidRecord { .. } => {
                Some("Every record must be a JSON object with a unique index in 0..n")
            }
            BatchError::Connection { .. } => Some("Check the server is running at --base_url"),
            BatchError::Timeout { .. } => Some("Raise --request_timeout or lower --max_tokens"),
            BatchError::Network { .. } => Some("Check network connectivity to the server"),
            BatchError::Service { .. } => Some("Check --model matches a model served at --base_url"),
            BatchError::MalformedResponse { .. } => {
                Some("Check --base_url points at an OpenAI-compatible /v1 endpoint")
            }
            BatchError::LimiterClosed => None,
            BatchError::TaskPanicked { .. } => None,
            BatchError::DuplicateOutcome { .. }
            | BatchError::OutcomeOutOfRange { .. }
            | BatchError::MissingOutcome { .. } => None,
            BatchError::Serialization { .. } => None,
            BatchError::OutputWrite { .. } => Some("Check the --output path and permissions"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════
