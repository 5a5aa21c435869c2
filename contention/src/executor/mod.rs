//! Executor — the execution strategies being compared
//!
//! An [`Executor`] takes a [`Run`] (how many tasks, which workload, which shared
//! state) and drives every task to an outcome. The built-in executors cover the
//! three disciplines this crate compares:
//!
//! - [`SequentialExecutor`]: one task at a time on a single worker thread. No
//!   synchronization, results in submission order.
//! - [`BoundedExecutor`]: every task gets its own worker, but a semaphore of
//!   admission tokens lets at most `max_concurrency` of them do work at once.
//!   Admitted workers increment the shared counter and append to the shared
//!   store. Results arrive in completion order.
//! - [`CooperativeExecutor`]: all tasks interleave inside a single task, switching
//!   only at the workload's cooperative wait. Results in submission order.
//!
//! # Failure policy
//! Executors are best-effort: a task that fails or panics is recorded as
//! [`TaskEntry::Failed`] in its own slot and its siblings keep going. Deciding
//! whether a run with failures is an error is left to the caller (the
//! [`Comparator`](crate::Comparator) only fails a run when *every* task failed).
//!
//! # Shared state discipline
//! Critical sections on the counter and the store are a single lock each and
//! never span a wait or an `.await`.
pub mod bounded;
pub mod cooperative;
pub mod sequential;

pub use bounded::{ActivityGauge, BoundedExecutor};
pub use cooperative::{COOPERATIVE_WORKER, CooperativeExecutor};
pub use sequential::{SEQUENTIAL_WORKER, SequentialExecutor};

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, TaskError, WorkloadError},
    record::{TaskEntry, TaskSummary},
    shared::SharedState,
    workload::Workload,
};

/// How tasks of a strategy relate to each other in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcurrencyMode {
    None,
    Parallel,
    Async,
}

/// Everything an executor needs for one invocation.
#[derive(Debug, Clone)]
pub struct Run<W> {
    pub item_count: usize,
    pub workload: Arc<W>,
    pub shared: SharedState,
}

impl<W: Workload> Run<W> {
    pub fn new(item_count: usize, workload: Arc<W>, shared: SharedState) -> Self {
        Self {
            item_count,
            workload,
            shared,
        }
    }
}

/// An execution strategy.
///
/// Implementations must produce exactly one [`TaskEntry`] per task id in
/// `0..run.item_count`.
pub trait Executor
where
    Self: Send + Sync + Sized,
{
    /// Human readable name of the strategy.
    fn label(&self) -> &'static str;

    fn mode(&self) -> ConcurrencyMode;

    /// Upper bound on tasks doing work at the same time, when the strategy has one.
    fn max_concurrency(&self) -> Option<usize> {
        None
    }

    /// Whether the strategy writes to the counter and the store.
    fn touches_shared_state(&self) -> bool {
        false
    }

    /// Run every task and return one entry per task.
    fn exec<W: Workload>(
        &self,
        run: &Run<W>,
    ) -> impl Future<Output = Result<Vec<TaskEntry>, Error>> + Send;
}

/// Turn the outcome of a worker into the task's result slot, logging failures.
///
/// The outer error is the worker dying (panic or cancellation), the inner one
/// the workload refusing the task.
pub(crate) fn settle(
    task_id: usize,
    outcome: Result<Result<TaskSummary, WorkloadError>, TaskError>,
) -> TaskEntry {
    let result = match outcome {
        Ok(Ok(summary)) => return TaskEntry::Completed(summary),
        Ok(Err(e)) => TaskError::from(e),
        Err(e) => e,
    };
    tracing::error!("Task {task_id} failed: {result}");
    TaskEntry::failed(task_id, &result)
}
