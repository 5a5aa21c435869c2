use std::sync::Arc;

use tokio::time::Instant;
use typed_builder::TypedBuilder;

use crate::{
    config::{Config, Limits},
    error::Error,
    executor::{
        BoundedExecutor, CooperativeExecutor, Executor, Run, SequentialExecutor,
        bounded::DEFAULT_MAX_CONCURRENCY,
    },
    record::TaskEntry,
    report::{RunReport, SystemInfo},
    shared::{SharedState, StoreStats},
    workload::{SimulatedWorkload, Workload},
};

/// Entry point that runs one workload under the different strategies and
/// reports how each one did.
///
/// A `Comparator` owns the [`SharedState`] every run contends for. Build one per
/// process and share it; runs may be issued concurrently from several tasks.
///
/// Requests are validated against [`Limits`] before any work starts.
///
/// ```
/// use std::time::Duration;
/// use contention::{Comparator, workload::SimulatedWorkload};
///
/// # #[tokio::main(flavor = "multi_thread")]
/// # async fn main() -> Result<(), contention::Error> {
/// let comparator = Comparator::builder()
///     .workload(
///         SimulatedWorkload::builder()
///             .intensity(1_000)
///             .io_wait(Duration::from_millis(1))
///             .build(),
///     )
///     .build();
///
/// let report = comparator.run_parallel(4, 2).await?;
/// assert_eq!(report.items_processed, 4);
/// assert_eq!(comparator.counter_snapshot(), 4);
/// # Ok(())
/// # }
/// ```
#[derive(TypedBuilder)]
pub struct Comparator<W: Workload> {
    #[builder(setter(transform = |workload: W| Arc::new(workload)))]
    workload: Arc<W>,
    #[builder(default)]
    shared: SharedState,
    #[builder(default)]
    limits: Limits,
    /// Admission tokens used by [`run_parallel_default`](Self::run_parallel_default).
    #[builder(default = DEFAULT_MAX_CONCURRENCY)]
    default_concurrency: usize,
}

impl Comparator<SimulatedWorkload> {
    pub fn from_config(config: &Config) -> Self {
        Self::builder()
            .workload(config.workload.build())
            .limits(config.limits)
            .default_concurrency(config.parallel.max_concurrency)
            .build()
    }
}

impl<W: Workload> Comparator<W> {
    /// Run `item_count` tasks one after another.
    pub async fn run_sequential(&self, item_count: usize) -> Result<RunReport, Error> {
        self.run_with(&SequentialExecutor, item_count).await
    }

    /// Run `item_count` tasks with at most `max_concurrency` of them working at once.
    pub async fn run_parallel(
        &self,
        item_count: usize,
        max_concurrency: usize,
    ) -> Result<RunReport, Error> {
        self.limits.check_concurrency(max_concurrency)?;
        self.run_with(&BoundedExecutor::new(max_concurrency), item_count)
            .await
    }

    /// [`run_parallel`](Self::run_parallel) with the configured concurrency.
    pub async fn run_parallel_default(&self, item_count: usize) -> Result<RunReport, Error> {
        self.run_parallel(item_count, self.default_concurrency)
            .await
    }

    /// Run `item_count` tasks interleaved on a single task.
    pub async fn run_async(&self, item_count: usize) -> Result<RunReport, Error> {
        self.run_with(&CooperativeExecutor, item_count).await
    }

    /// Run `item_count` tasks under any executor.
    pub async fn run_with<E: Executor>(
        &self,
        executor: &E,
        item_count: usize,
    ) -> Result<RunReport, Error> {
        self.limits.check_items(item_count)?;

        let run = Run::new(item_count, Arc::clone(&self.workload), self.shared.clone());
        tracing::info!("Running {} strategy on {item_count} items...", executor.label());

        let start = Instant::now();
        let results = executor.exec(&run).await?;
        let elapsed = start.elapsed();
        debug_assert_eq!(results.len(), item_count);

        if results.iter().all(|e| !e.is_completed()) {
            let failures: Vec<String> = results
                .iter()
                .filter_map(|e| match e {
                    TaskEntry::Failed(f) => Some(f.error.clone()),
                    TaskEntry::Completed(_) => None,
                })
                .collect();
            tracing::error!("Every task of the {} run failed.", executor.label());
            return Err(Error::AllTasksFailed { failures });
        }

        let mut report = RunReport::new(executor.label(), executor.mode(), elapsed, results);
        report.max_concurrency = executor.max_concurrency();
        if executor.touches_shared_state() {
            report.store_stats = Some(self.shared.store().checked_stats()?);
            report.shared_counter = Some(self.shared.counter().snapshot());
        }

        tracing::info!(
            "Done running {}: {} completed, {} failed in {}s.",
            report.strategy,
            report.completed(),
            report.failed(),
            report.duration_seconds
        );
        Ok(report)
    }

    pub fn counter_snapshot(&self) -> u64 {
        self.shared.counter().snapshot()
    }

    pub fn store_stats(&self) -> StoreStats {
        self.shared.store().stats()
    }

    pub fn system_info(&self) -> SystemInfo {
        SystemInfo {
            cpu_count: num_cpus::get(),
            shared_counter: self.counter_snapshot(),
            store_stats: self.store_stats(),
        }
    }

    pub fn shared(&self) -> &SharedState {
        &self.shared
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn default_concurrency(&self) -> usize {
        self.default_concurrency
    }
}
