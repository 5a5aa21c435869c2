//! Synthetic stand-ins for real work.
//!
//! A [`Workload`] has two halves: a CPU-bound [`compute`](Workload::compute) step
//! that touches no shared state, and an I/O-like wait. The wait comes in two
//! flavours so the same workload can be driven by every strategy:
//! [`wait`](Workload::wait) parks the calling OS thread, while
//! [`wait_cooperative`](Workload::wait_cooperative) only suspends the calling task
//! and hands the thread back to the scheduler.

use std::time::Duration;

use typed_builder::TypedBuilder;

use crate::error::WorkloadError;

/// One unit of work, shared by reference across every worker of a run.
pub trait Workload
where
    Self: Send + Sync + 'static,
{
    /// CPU-bound, side-effect free part of task `task_id`.
    fn compute(&self, task_id: usize) -> Result<f64, WorkloadError>;

    /// How long the simulated I/O takes.
    fn io_wait(&self) -> Duration;

    /// Block the calling thread for [`io_wait`](Workload::io_wait).
    fn wait(&self) {
        wait(self.io_wait());
    }

    /// Suspend the calling task for [`io_wait`](Workload::io_wait) without blocking
    /// the thread it runs on.
    fn wait_cooperative(&self) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(self.io_wait())
    }
}

/// The reference workload: a trigonometric sum plus a fixed sleep.
///
/// ```
/// use std::time::Duration;
/// use contention::workload::{SimulatedWorkload, Workload};
///
/// let workload = SimulatedWorkload::builder()
///     .intensity(1_000)
///     .io_wait(Duration::from_millis(1))
///     .build();
/// assert_eq!(workload.compute(0).unwrap(), workload.compute(7).unwrap());
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct SimulatedWorkload {
    /// Number of loop iterations in the compute step.
    #[builder(default = DEFAULT_INTENSITY)]
    pub intensity: u64,
    #[builder(default = DEFAULT_IO_WAIT)]
    pub io_wait: Duration,
}

pub const DEFAULT_INTENSITY: u64 = 500_000;
pub const DEFAULT_IO_WAIT: Duration = Duration::from_millis(50);

impl Default for SimulatedWorkload {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Workload for SimulatedWorkload {
    fn compute(&self, _task_id: usize) -> Result<f64, WorkloadError> {
        Ok(compute(self.intensity))
    }

    fn io_wait(&self) -> Duration {
        self.io_wait
    }
}

/// `Σ sqrt(i) * sin(i)` for `i` in `0..intensity`.
///
/// Deterministic for a given `intensity` and proportional to it in cost.
pub fn compute(intensity: u64) -> f64 {
    (0..intensity)
        .map(|i| {
            let x = i as f64;
            x.sqrt() * x.sin()
        })
        .sum()
}

/// Park the current thread for roughly `duration`.
pub fn wait(duration: Duration) {
    if !duration.is_zero() {
        std::thread::sleep(duration);
    }
}
