//! Contention — run the same batch of work under different concurrency
//! strategies and compare how they behave.
//!
//! A batch is `item_count` tasks of one [`Workload`]: a CPU-bound compute step
//! followed by an I/O-like wait. The crate runs that batch three ways:
//!
//! - **sequential**: one task at a time, nothing shared.
//! - **bounded-parallel**: one worker per task, at most `max_concurrency` of them
//!   admitted at once by a semaphore. Admitted workers bump a shared counter and
//!   append to a shared, append-only store, both mutex guarded.
//! - **cooperative**: all tasks interleaved on one task, yielding only while
//!   they wait.
//!
//! Each run produces a [`RunReport`] with timings, per-task results and, for the
//! parallel strategy, a snapshot of the shared state so its consistency can be
//! checked: after any successful run the counter has grown by exactly the
//! number of completed tasks and the store by the same number of records.
//!
//! # Architecture
//!
//! - [`Workload`]: the work itself. [`SimulatedWorkload`](workload::SimulatedWorkload)
//!   is the reference trigonometric loop plus sleep.
//! - [`Executor`]: one execution strategy. The built-ins are
//!   [`SequentialExecutor`], [`BoundedExecutor`] and [`CooperativeExecutor`].
//! - [`SharedState`]: the counter and the store every run contends for, injected
//!   rather than global.
//! - [`Comparator`]: validates requests, drives an executor and assembles the
//!   [`RunReport`].
//! - [`Reporter`]: sends reports somewhere; [`JsonReporter`](report::JsonReporter)
//!   writes JSON lines.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use contention::{Comparator, workload::SimulatedWorkload};
//!
//! #[tokio::main]
//! async fn main() {
//!     let comparator = Comparator::builder()
//!         .workload(
//!             SimulatedWorkload::builder()
//!                 .intensity(10_000)
//!                 .io_wait(Duration::from_millis(5))
//!                 .build(),
//!         )
//!         .build();
//!
//!     let sequential = comparator.run_sequential(5).await.unwrap();
//!     let parallel = comparator.run_parallel(5, 5).await.unwrap();
//!     let cooperative = comparator.run_async(5).await.unwrap();
//!
//!     for report in [&sequential, &parallel, &cooperative] {
//!         println!("{}: {}s", report.strategy, report.duration_seconds);
//!     }
//!     assert_eq!(comparator.counter_snapshot(), 5);
//! }
//! ```

/// Entry point tying workload, strategies and shared state together
pub mod comparator;
/// TOML configuration
pub mod config;
/// Error types
pub mod error;
/// Execution strategies
pub mod executor;
/// Values produced by tasks
pub mod record;
/// Run reports and reporters
pub mod report;
/// Counter and store shared between workers
pub mod shared;
/// Synthetic work
pub mod workload;

pub use comparator::Comparator;
pub use config::Config;
pub use error::{Error, Result};
pub use executor::{BoundedExecutor, ConcurrencyMode, CooperativeExecutor, Executor, SequentialExecutor};
pub use record::{Record, TaskEntry, TaskRecord, TaskSummary};
pub use report::{Reporter, RunReport, SystemInfo};
pub use shared::{SharedState, SharedStore, StoreStats, SynchronizedCounter};
pub use workload::Workload;

/// Procedural macros to reduce boilerplate
pub mod macros {
    pub use contention_macros::*;
}
