//! Runtime Module - bounded concurrent dispatch
//!
//! Contains the execution components:
//! - `limiter`: counting-permit gate on in-flight requests
//! - `task`: per-record state machine (Pending → Admitted → InFlight → terminal)
//! - `executor`: one inference call per task, failures captured as outcomes
//! - `dispatcher`: fan-out over all records, ordered fan-in of outcomes

mod dispatcher;
mod executor;
mod limiter;
mod task;

pub use dispatcher::{Dispatcher, RunReport, RunStats};
pub use executor::{InferSettings, RequestExecutor};
pub use limiter::{ConcurrencyLimiter, Permit};
pub use task::{Task, TaskState};
