use std::time::Duration;

use contention::{
    Comparator, Reporter, error::WorkloadError, report::JsonReporter, workload::Workload,
};

/// Hashes a buffer instead of summing sines, and fails every seventh task.
struct Checksum {
    buffer: Vec<u8>,
}

impl Workload for Checksum {
    fn compute(&self, task_id: usize) -> Result<f64, WorkloadError> {
        if task_id % 7 == 6 {
            return Err(WorkloadError::new(task_id, "simulated timeout"));
        }
        let sum = self
            .buffer
            .iter()
            .fold(task_id as u64, |acc, b| acc.wrapping_mul(31).wrapping_add(*b as u64));
        Ok((sum % 1_000_000) as f64)
    }

    fn io_wait(&self) -> Duration {
        Duration::from_millis(20)
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    // Build heavy things once, outside the workload's hot path.
    let comparator = Comparator::builder()
        .workload(Checksum {
            buffer: vec![7; 64 * 1024],
        })
        .build();

    let report = comparator.run_parallel(14, 4).await.unwrap();
    println!(
        "{} completed, {} failed, counter at {}",
        report.completed(),
        report.failed(),
        comparator.counter_snapshot()
    );

    JsonReporter::stdout(true).report(&report).await.unwrap();
}
