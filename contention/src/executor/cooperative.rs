use std::panic::AssertUnwindSafe;

use futures::{FutureExt, future::join_all};

use super::{ConcurrencyMode, Executor, Run, settle};
use crate::{
    error::{Error, TaskError, WorkloadError},
    record::{TaskEntry, TaskSummary},
    workload::Workload,
};

/// Label carried by every task of a cooperative run. They all share one
/// logical thread, so a thread name would not tell them apart.
pub const COOPERATIVE_WORKER: &str = "async_coroutine";

/// Runs every task concurrently inside a single task.
///
/// All task futures are created up front and then polled together with
/// [`join_all`], so exactly one of them makes progress at a time and control
/// only changes hands at [`Workload::wait_cooperative`]. Results are collected
/// in submission order.
///
/// The compute step is *not* a suspension point: once a task resumes after its
/// wait it computes to completion and the whole cooperative group stalls for
/// that long. With large intensities this starves the other tasks; move the
/// compute to the blocking pool if that matters more than the comparison.
///
/// A task whose workload fails or panics gets a [`TaskEntry::Failed`] slot. The
/// panic is caught at the task's own future, so its siblings keep running.
///
/// Like the sequential baseline, this strategy does not touch shared state.
#[derive(Debug, Clone, Copy, Default)]
pub struct CooperativeExecutor;

impl Executor for CooperativeExecutor {
    fn label(&self) -> &'static str {
        "cooperative"
    }

    fn mode(&self) -> ConcurrencyMode {
        ConcurrencyMode::Async
    }

    async fn exec<W: Workload>(&self, run: &Run<W>) -> Result<Vec<TaskEntry>, Error> {
        tracing::info!("Launching {} cooperative tasks...", run.item_count);
        let workload = run.workload.as_ref();

        let tasks: Vec<_> = (0..run.item_count)
            .map(|task_id| async move {
                let outcome = AssertUnwindSafe(process(task_id, workload))
                    .catch_unwind()
                    .await
                    .map_err(TaskError::from_panic);
                settle(task_id, outcome)
            })
            .collect();

        Ok(join_all(tasks).await)
    }
}

/// One cooperative task: yield during the wait, then compute in place.
async fn process<W: Workload>(task_id: usize, workload: &W) -> Result<TaskSummary, WorkloadError> {
    workload.wait_cooperative().await;
    let result = workload.compute(task_id)?;
    tracing::debug!("Cooperative task {task_id} done.");
    Ok(TaskSummary::new(task_id, result, COOPERATIVE_WORKER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{shared::SharedState, workload::SimulatedWorkload};
    use parking_lot::Mutex;
    use std::{
        collections::HashSet,
        sync::Arc,
        time::{Duration, Instant},
    };

    /// Logs the order in which tasks compute.
    struct Journal {
        wait: Duration,
        order: Mutex<Vec<usize>>,
    }

    impl Workload for Journal {
        fn compute(&self, task_id: usize) -> Result<f64, WorkloadError> {
            self.order.lock().push(task_id);
            Ok(0.0)
        }

        fn io_wait(&self) -> Duration {
            self.wait
        }
    }

    /// Odd tasks return an error.
    struct OddTasksFail;

    impl Workload for OddTasksFail {
        fn compute(&self, task_id: usize) -> Result<f64, WorkloadError> {
            if task_id % 2 == 1 {
                return Err(WorkloadError::new(task_id, "odd task"));
            }
            Ok(task_id as f64)
        }

        fn io_wait(&self) -> Duration {
            Duration::from_millis(1)
        }
    }

    /// Task 2 panics, the rest succeed.
    struct PanicsOnTwo;

    impl Workload for PanicsOnTwo {
        fn compute(&self, task_id: usize) -> Result<f64, WorkloadError> {
            if task_id == 2 {
                panic!("task {task_id} exploded");
            }
            Ok(1.0)
        }

        fn io_wait(&self) -> Duration {
            Duration::from_millis(1)
        }
    }

    #[tokio::test]
    async fn completes_every_task_once() {
        let workload = Arc::new(
            SimulatedWorkload::builder()
                .intensity(1_000)
                .io_wait(Duration::from_millis(5))
                .build(),
        );
        let run = Run::new(5, workload, SharedState::new());
        let entries = CooperativeExecutor.exec(&run).await.unwrap();

        assert_eq!(entries.len(), 5);
        let ids: HashSet<usize> = entries.iter().map(TaskEntry::task_id).collect();
        assert_eq!(ids.len(), 5);
        assert!(entries.iter().all(TaskEntry::is_completed));
    }

    #[tokio::test]
    async fn waits_overlap_on_one_task() {
        let journal = Arc::new(Journal {
            wait: Duration::from_millis(100),
            order: Mutex::new(vec![]),
        });
        let run = Run::new(5, Arc::clone(&journal), SharedState::new());

        let start = Instant::now();
        let entries = CooperativeExecutor.exec(&run).await.unwrap();

        // Five 100ms waits back to back would take 500ms.
        assert!(start.elapsed() < Duration::from_millis(400));
        assert_eq!(journal.order.lock().len(), 5);

        let ids: Vec<usize> = entries.iter().map(TaskEntry::task_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn does_not_touch_shared_state() {
        let shared = SharedState::new();
        let journal = Arc::new(Journal {
            wait: Duration::ZERO,
            order: Mutex::new(vec![]),
        });
        let run = Run::new(3, journal, shared.clone());
        CooperativeExecutor.exec(&run).await.unwrap();

        assert_eq!(shared.counter().snapshot(), 0);
        assert!(shared.store().is_empty());
    }

    #[tokio::test]
    async fn failures_stay_in_their_slot() {
        let run = Run::new(5, Arc::new(OddTasksFail), SharedState::new());
        let entries = CooperativeExecutor.exec(&run).await.unwrap();

        assert_eq!(entries.len(), 5);
        let failed: Vec<usize> = entries
            .iter()
            .filter(|e| !e.is_completed())
            .map(TaskEntry::task_id)
            .collect();
        assert_eq!(failed, vec![1, 3]);
        match &entries[1] {
            TaskEntry::Failed(f) => assert!(f.error.contains("odd task")),
            other => panic!("expected a failure, got {other:?}"),
        }
        assert!(
            entries
                .iter()
                .filter_map(TaskEntry::summary)
                .all(|s| s.processed_by == COOPERATIVE_WORKER)
        );
    }

    #[tokio::test]
    async fn panicking_task_spares_its_siblings() {
        let run = Run::new(5, Arc::new(PanicsOnTwo), SharedState::new());
        let entries = CooperativeExecutor.exec(&run).await.unwrap();

        assert_eq!(entries.len(), 5);
        assert_eq!(entries.iter().filter(|e| e.is_completed()).count(), 4);
        match &entries[2] {
            TaskEntry::Failed(f) => {
                assert_eq!(f.task_id, 2);
                assert!(f.error.contains("panicked"));
                assert!(f.error.contains("task 2 exploded"));
            }
            other => panic!("expected a failure, got {other:?}"),
        }
    }
}
