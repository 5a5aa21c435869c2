use std::sync::Arc;

use super::{ConcurrencyMode, Executor, Run, settle};
use crate::{
    error::{Error, TaskError, WorkloadError},
    record::{TaskEntry, TaskSummary},
    workload::Workload,
};

/// Label carried by every task of a sequential run. There is only ever one
/// worker, so its thread name adds nothing.
pub const SEQUENTIAL_WORKER: &str = "single_thread";

/// The baseline: tasks run one after another, each to completion before the
/// next one starts.
///
/// With nothing running concurrently there is nothing to protect, so this
/// strategy leaves the shared counter and store alone. Results come back in
/// submission order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialExecutor;

impl Executor for SequentialExecutor {
    fn label(&self) -> &'static str {
        "sequential"
    }

    fn mode(&self) -> ConcurrencyMode {
        ConcurrencyMode::None
    }

    async fn exec<W: Workload>(&self, run: &Run<W>) -> Result<Vec<TaskEntry>, Error> {
        tracing::info!("Running {} tasks sequentially...", run.item_count);
        let mut entries = Vec::with_capacity(run.item_count);

        for task_id in 0..run.item_count {
            let workload = Arc::clone(&run.workload);
            // Blocking work goes to the blocking pool, one task at a time.
            let outcome = tokio::task::spawn_blocking(move || process(task_id, workload.as_ref()))
                .await
                .map_err(TaskError::from_join);
            entries.push(settle(task_id, outcome));
        }

        Ok(entries)
    }
}

fn process<W: Workload>(task_id: usize, workload: &W) -> Result<TaskSummary, WorkloadError> {
    let result = workload.compute(task_id)?;
    workload.wait();
    tracing::debug!("Task {task_id} done.");
    Ok(TaskSummary::new(task_id, result, SEQUENTIAL_WORKER))
}
