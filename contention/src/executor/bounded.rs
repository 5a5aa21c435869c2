use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::{sync::Semaphore, task::JoinHandle};
use typed_builder::TypedBuilder;

use super::{ConcurrencyMode, Executor, Run, settle};
use crate::{
    error::{Error, TaskError, WorkloadError},
    record::{TaskEntry, TaskRecord, TaskSummary, worker_identity},
    shared::SharedState,
    workload::Workload,
};

pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

/// Executor that gives every task its own worker and bounds how many of them
/// may work at the same time.
///
/// Admission is controlled by a [`tokio::sync::Semaphore`] holding
/// `max_concurrency` tokens, created fresh for every run.
///
/// - Each task is spawned as a Tokio task that waits for a token. Waiting only
///   parks that task, never the runtime.
/// - Once admitted, the owned permit is moved into a blocking worker
///   (`spawn_blocking`) which runs the workload, increments the shared counter
///   and appends a [`TaskRecord`] to the shared store.
/// - The permit is a local of the blocking closure, so it goes back to the
///   semaphore however the closure exits: success, workload error or panic.
///   Each release wakes one waiter.
/// - Results are collected as workers finish, so their order is completion
///   order, not submission order.
///
/// A task whose workload fails or panics gets a [`TaskEntry::Failed`] slot; the
/// other tasks are not affected.
///
/// # Tuning knobs
///
/// - `max_concurrency`: number of admission tokens. Defaults to
///   [`DEFAULT_MAX_CONCURRENCY`].
#[derive(Debug, TypedBuilder)]
pub struct BoundedExecutor {
    /// The number of admission tokens.
    #[builder(default = DEFAULT_MAX_CONCURRENCY)]
    pub max_concurrency: usize,
    #[builder(default, setter(skip))]
    gauge: Arc<ActivityGauge>,
}

impl Default for BoundedExecutor {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl BoundedExecutor {
    pub fn new(max_concurrency: usize) -> Self {
        Self::builder().max_concurrency(max_concurrency).build()
    }

    /// Live view of how many workers currently hold a token.
    pub fn gauge(&self) -> &ActivityGauge {
        &self.gauge
    }
}

impl Executor for BoundedExecutor {
    fn label(&self) -> &'static str {
        "bounded-parallel"
    }

    fn mode(&self) -> ConcurrencyMode {
        ConcurrencyMode::Parallel
    }

    fn max_concurrency(&self) -> Option<usize> {
        Some(self.max_concurrency)
    }

    fn touches_shared_state(&self) -> bool {
        true
    }

    async fn exec<W: Workload>(&self, run: &Run<W>) -> Result<Vec<TaskEntry>, Error> {
        if self.max_concurrency == 0 || self.max_concurrency > Semaphore::MAX_PERMITS {
            return Err(Error::ResourceExhaustion {
                what: "max_concurrency",
                value: self.max_concurrency,
                min: 1,
                max: Semaphore::MAX_PERMITS,
            });
        }

        let admission = Arc::new(Semaphore::new(self.max_concurrency));
        tracing::info!(
            "Spawning {} workers behind {} admission tokens...",
            run.item_count,
            self.max_concurrency
        );
        let handles = spawn_workers(admission, Arc::clone(&self.gauge), run);

        let mut pending: FuturesUnordered<_> = handles
            .into_iter()
            .enumerate()
            .map(|(task_id, handle)| async move { (task_id, handle.await) })
            .collect();

        let mut entries = Vec::with_capacity(run.item_count);
        while let Some((task_id, joined)) = pending.next().await {
            let entry = match joined {
                Ok(entry) => entry,
                Err(e) => {
                    let err = TaskError::from_join(e);
                    tracing::error!("Worker {task_id} died: {err}");
                    TaskEntry::failed(task_id, &err)
                }
            };
            entries.push(entry);
        }

        tracing::info!(
            "All {} workers joined, peak concurrency so far {}.",
            entries.len(),
            self.gauge.peak()
        );
        Ok(entries)
    }
}

/// Spawns one Tokio task per item. Each one waits for an admission token, then
/// hands the token and the work to the blocking pool.
fn spawn_workers<W: Workload>(
    admission: Arc<Semaphore>,
    gauge: Arc<ActivityGauge>,
    run: &Run<W>,
) -> Vec<JoinHandle<TaskEntry>> {
    (0..run.item_count)
        .map(|task_id| {
            let admission = Arc::clone(&admission);
            let gauge = Arc::clone(&gauge);
            let workload = Arc::clone(&run.workload);
            let shared = run.shared.clone();

            tokio::spawn(async move {
                let permit = match admission.acquire_owned().await {
                    Ok(p) => p,
                    Err(_) => {
                        tracing::debug!(
                            "Worker {task_id} failed to acquire token (semaphore closed)."
                        );
                        return TaskEntry::failed(task_id, &TaskError::Aborted);
                    }
                };
                tracing::debug!("Worker {task_id} admitted.");

                let outcome = tokio::task::spawn_blocking(move || {
                    // Declared first so it is dropped last, after the gauge guard.
                    let _permit = permit;
                    let _active = gauge.enter();
                    process(task_id, workload.as_ref(), &shared)
                })
                .await
                .map_err(TaskError::from_join);

                settle(task_id, outcome)
            })
        })
        .collect()
}

/// The admitted part of a task: work, then one increment and one append.
fn process<W: Workload>(
    task_id: usize,
    workload: &W,
    shared: &SharedState,
) -> Result<TaskSummary, WorkloadError> {
    let result = workload.compute(task_id)?;
    workload.wait();

    let counter_value = shared.counter().increment();
    let worker = worker_identity();
    shared
        .store()
        .append(TaskRecord::new(task_id, result, worker.clone()));

    tracing::debug!("Worker {task_id} done, counter at {counter_value}.");
    Ok(TaskSummary::new(task_id, result, worker).with_counter(counter_value))
}

/// Counts workers between admission and release.
#[derive(Debug, Default)]
pub struct ActivityGauge {
    active: AtomicUsize,
    peak: AtomicUsize,
    admitted: AtomicUsize,
}

impl ActivityGauge {
    /// Mark one worker as active until the guard is dropped.
    pub fn enter(&self) -> ActiveGuard<'_> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.admitted.fetch_add(1, Ordering::Relaxed);
        ActiveGuard { gauge: self }
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously active workers ever observed.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Total number of admissions.
    pub fn admitted(&self) -> usize {
        self.admitted.load(Ordering::Relaxed)
    }
}

pub struct ActiveGuard<'a> {
    gauge: &'a ActivityGauge,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.gauge.active.fetch_sub(1, Ordering::SeqCst);
    }
}
