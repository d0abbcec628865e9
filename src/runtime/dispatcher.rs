//! Dispatcher - bounded fan-out / ordered fan-in over all records
//!
//! One tokio task per record, collected with a [`JoinSet`]:
//! - each task renders its prompt, waits for a limiter permit, runs the
//!   executor, then drops the permit
//! - outcomes are collected in completion order into a [`ResultSet`]
//! - the run returns only after every task is terminal
//!
//! A failing task never cancels its siblings. A panicking task is mapped back
//! to its record index and recorded as a failure outcome.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, info_span, Instrument};

use crate::dataset::Record;
use crate::error::{BatchError, Result};
use crate::store::{Outcome, ResultSet};
use crate::template::PromptTemplate;

use super::executor::RequestExecutor;
use super::limiter::ConcurrencyLimiter;
use super::task::{failed_outcome, Task, TaskState};

/// Counters for a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct RunStats {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Highest number of simultaneously admitted tasks
    pub peak_in_flight: usize,
    pub elapsed: Duration,
}

/// Everything a finished run produced
#[derive(Debug)]
pub struct RunReport {
    pub run_id: String,
    /// One outcome per record, ordered by index
    pub outcomes: Vec<Outcome>,
    pub stats: RunStats,
}

/// Drives every record to a terminal outcome under a concurrency cap
#[derive(Clone)]
pub struct Dispatcher {
    executor: RequestExecutor,
    limiter: ConcurrencyLimiter,
    template: Arc<PromptTemplate>,
}

impl Dispatcher {
    pub fn new(
        executor: RequestExecutor,
        limiter: ConcurrencyLimiter,
        template: PromptTemplate,
    ) -> Self {
        Self {
            executor,
            limiter,
            template: Arc::new(template),
        }
    }

    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }

    /// Process all records and return their outcomes in index order.
    ///
    /// Records must carry dense indices `0..records.len()`. Errors returned
    /// here are run-level invariant violations; per-record failures are
    /// outcomes.
    pub async fn run(&self, records: Vec<Record>) -> Result<RunReport> {
        let run_id = format!("run-{}", uuid::Uuid::new_v4());
        let span = info_span!(
            "dispatch",
            run_id = %run_id,
            records = records.len(),
            max_concurrent = self.limiter.capacity(),
            provider = self.executor.provider_name(),
        );
        self.dispatch(run_id, records).instrument(span).await
    }

    async fn dispatch(&self, run_id: String, records: Vec<Record>) -> Result<RunReport> {
        let started = Instant::now();
        let total = records.len();
        check_indices(&records)?;
        info!("Starting batch dispatch");

        let mut results = ResultSet::new(total);
        let mut join_set = JoinSet::new();
        let mut index_of = FxHashMap::default();

        for record in records {
            let index = record.index();
            let handle = join_set.spawn(run_task(
                record,
                Arc::clone(&self.template),
                self.executor.clone(),
                self.limiter.clone(),
            ));
            index_of.insert(handle.id(), index);
        }

        let mut progress = Progress::new(total);

        // Wait for all spawned tasks to complete
        while let Some(joined) = join_set.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => match index_of.get(&e.id()) {
                    Some(&index) => failed_outcome(
                        index,
                        BatchError::TaskPanicked {
                            index,
                            message: join_error_message(e),
                        },
                    ),
                    None => {
                        error!(task_id = %e.id(), "Joined a task that was never spawned here");
                        continue;
                    }
                },
            };

            progress.record(outcome.is_success());
            results.record(outcome)?;
        }

        let outcomes = results.finalize()?;
        let stats = RunStats {
            total,
            succeeded: progress.succeeded,
            failed: progress.failed,
            peak_in_flight: self.limiter.peak_in_flight(),
            elapsed: started.elapsed(),
        };

        info!(
            succeeded = stats.succeeded,
            failed = stats.failed,
            peak_in_flight = stats.peak_in_flight,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "Batch dispatch finished"
        );

        Ok(RunReport {
            run_id,
            outcomes,
            stats,
        })
    }
}

/// Reject a record set whose indices are not exactly `0..len`, before any
/// request is sent
fn check_indices(records: &[Record]) -> Result<()> {
    let mut seen = vec![false; records.len()];
    for record in records {
        let index = record.index();
        let reason = match seen.get_mut(index) {
            Some(slot) if !*slot => {
                *slot = true;
                continue;
            }
            Some(_) => "index appears more than once".to_string(),
            None => format!("index is outside 0..{}", records.len()),
        };
        return Err(BatchError::InvalidRecord { index, reason });
    }
    Ok(())
}

/// One record from `Pending` to a terminal outcome
async fn run_task(
    record: Record,
    template: Arc<PromptTemplate>,
    executor: RequestExecutor,
    limiter: ConcurrencyLimiter,
) -> Outcome {
    let prompt = match template.render(record.fields()) {
        Ok(prompt) => prompt,
        Err(e) => return failed_outcome(record.index(), e),
    };
    let mut task = Task::new(record, prompt);

    let permit = match limiter.acquire().await {
        Ok(permit) => permit,
        Err(e) => return task.fail(e),
    };
    task.advance(TaskState::Admitted);

    let outcome = executor.execute(task).await;
    permit.release();
    outcome
}

fn join_error_message(err: JoinError) -> String {
    if err.is_cancelled() {
        return "task was cancelled".to_string();
    }
    let payload = err.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Completion counters with a progress line each time another 10% completes
struct Progress {
    total: usize,
    done: usize,
    succeeded: usize,
    failed: usize,
    /// Last decile (0..=10) a progress line was logged for
    logged_decile: usize,
}

impl Progress {
    fn new(total: usize) -> Self {
        Self {
            total,
            done: 0,
            succeeded: 0,
            failed: 0,
            logged_decile: 0,
        }
    }

    /// Count one outcome; returns true when a progress line was logged
    fn record(&mut self, success: bool) -> bool {
        self.done += 1;
        if success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }

        let decile = self.done * 10 / self.total.max(1);
        if decile > self.logged_decile {
            self.logged_decile = decile;
            info!(
                done = self.done,
                total = self.total,
                succeeded = self.succeeded,
                failed = self.failed,
                "Progress"
            );
            return true;
        }
        false
    }
}
