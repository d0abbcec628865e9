//! Task - one record moving through the dispatch state machine
//!
//! ```text
//! Pending ──► Admitted ──► InFlight ──► Succeeded
//!    │            │            │
//!    └────────────┴────────────┴──────► Failed
//! ```
//!
//! `Succeeded` and `Failed` are terminal; finishing a task consumes it and
//! yields its [`Outcome`].

use tracing::{trace, warn};

use crate::dataset::Record;
use crate::error::BatchError;
use crate::store::Outcome;

/// Lifecycle state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Created, waiting for a permit
    Pending,
    /// Permit held
    Admitted,
    /// Inference call outstanding
    InFlight,
    Succeeded,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Whether `self → next` is a legal transition
    pub fn can_transition_to(self, next: TaskState) -> bool {
        use TaskState::*;
        matches!(
            (self, next),
            (Pending, Admitted)
                | (Admitted, InFlight)
                | (InFlight, Succeeded)
                | (Pending | Admitted | InFlight, Failed)
        )
    }
}

/// A record paired with its rendered prompt
#[derive(Debug)]
pub struct Task {
    record: Record,
    prompt: String,
    state: TaskState,
}

impl Task {
    pub fn new(record: Record, prompt: String) -> Self {
        Self {
            record,
            prompt,
            state: TaskState::Pending,
        }
    }

    pub fn index(&self) -> usize {
        self.record.index()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Move to a non-terminal state
    pub fn advance(&mut self, next: TaskState) {
        debug_assert!(
            !next.is_terminal(),
            "terminal states are reached through succeed/fail"
        );
        self.transition(next);
    }

    fn transition(&mut self, next: TaskState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal task transition {:?} -> {:?}",
            self.state,
            next
        );
        trace!(idx = self.index(), from = ?self.state, to = ?next, "Task transition");
        self.state = next;
    }

    /// Finish with a response; the record's fields move into the outcome.
    ///
    /// `None` is a server reply without message content.
    pub fn succeed(mut self, response: Option<String>) -> Outcome {
        self.transition(TaskState::Succeeded);
        let index = self.index();
        let fields = self.record.into_fields();
        match response {
            Some(response) => Outcome::success(index, self.prompt, response, fields),
            None => Outcome::success_without_content(index, self.prompt, fields),
        }
    }

    /// Finish with an error
    pub fn fail(mut self, error: BatchError) -> Outcome {
        self.transition(TaskState::Failed);
        failed_outcome(self.index(), error)
    }
}

/// Failure outcome for a record that never became a task (or just stopped being one)
pub(crate) fn failed_outcome(index: usize, error: BatchError) -> Outcome {
    warn!("[{}] Failed to process item: {}", index, error);
    Outcome::failure(index, error)
}
