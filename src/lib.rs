//! batch-infer - bounded-concurrency batch inference driver
//!
//! Loads a dataset, renders one prompt per record, sends every prompt to an
//! OpenAI-compatible chat completion server with at most `max_concurrent`
//! requests in flight, and writes one outcome per record in input order.
//!
//! ## Module Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          INPUT                               │
//! │  dataset/   local JSON/JSONL or hub rows → indexed Records   │
//! │  template/  prompt templates, presets, resolution            │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        EXECUTION                             │
//! │  runtime/   limiter, task state machine, executor, dispatch  │
//! │  provider/  Provider trait, OpenAI-compatible HTTP, mock     │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         RESULTS                              │
//! │  store/     Outcome + ResultSet (ordered, one slot per idx)  │
//! │  output     predictions file writer                          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`dataset`] | Record loading and indexing |
//! | [`template`] | `{field}` templates, preset table, auto-detection |
//! | [`runtime`] | Concurrency cap and dispatch with tokio |
//! | [`provider`] | Inference transport |
//! | [`store`] | Outcomes and the result aggregator |
//! | [`output`] | Pretty JSON predictions file |
//! | [`config`] | CLI + environment settings, validation |
//! | [`error`] | Error types with fix suggestions |

// ═══════════════════════════════════════════════════════════════
// INPUT - records and prompts
// ═══════════════════════════════════════════════════════════════
pub mod dataset;
pub mod template;

// ═══════════════════════════════════════════════════════════════
// EXECUTION - dispatch and transport
// ═══════════════════════════════════════════════════════════════
pub mod provider;
pub mod runtime;

// ═══════════════════════════════════════════════════════════════
// RESULTS - aggregation and output
// ═══════════════════════════════════════════════════════════════
pub mod output;
pub mod store;

// ═══════════════════════════════════════════════════════════════
// SUPPORT
// ═══════════════════════════════════════════════════════════════
pub mod config;
pub mod error;
pub mod util;

// Re-exports for convenience
pub use config::RunConfig;
pub use dataset::{Dataset, DatasetSource, Record};
pub use error::{BatchError, FixSuggestion, Result};
pub use output::write_predictions;
pub use provider::{InferRequest, MockProvider, OpenAIProvider, Provider};
pub use runtime::{ConcurrencyLimiter, Dispatcher, InferSettings, RequestExecutor, RunReport};
pub use store::{Outcome, ResultSet};
pub use template::{resolve_template, PromptTemplate, TemplatePreset, TemplateSource};
