use std::{fmt::Debug, io::Write, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    executor::ConcurrencyMode,
    record::{TaskEntry, round_to},
    shared::StoreStats,
};

/// Outcome of one strategy invocation.
///
/// Built once by the [`Comparator`](crate::Comparator), handed back to the caller
/// and never kept around.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub strategy: String,
    pub items_processed: usize,
    /// Wall clock time of the whole run, to the millisecond.
    pub duration_seconds: f64,
    pub results: Vec<TaskEntry>,
    pub concurrency: ConcurrencyMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,
    /// Counter value right after the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_counter: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_stats: Option<StoreStats>,
}

impl RunReport {
    pub fn new(
        strategy: impl Into<String>,
        concurrency: ConcurrencyMode,
        elapsed: Duration,
        results: Vec<TaskEntry>,
    ) -> Self {
        Self {
            strategy: strategy.into(),
            items_processed: results.len(),
            duration_seconds: round_to(elapsed.as_secs_f64(), 3),
            results,
            concurrency,
            max_concurrency: None,
            shared_counter: None,
            store_stats: None,
        }
    }

    pub fn completed(&self) -> usize {
        self.results.iter().filter(|e| e.is_completed()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.completed()
    }
}

/// Point-in-time view of the process for monitoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub cpu_count: usize,
    pub shared_counter: u64,
    pub store_stats: StoreStats,
}

/// Sends reports somewhere: stdout, a file, a socket.
#[async_trait]
pub trait Reporter<R>
where
    R: Serialize + Debug + Sync,
{
    async fn report(&self, report: &R) -> Result<(), Error>;
}

/// Writes every report as one JSON document followed by a newline.
pub struct JsonReporter<W> {
    out: Mutex<W>,
    pretty: bool,
}

impl JsonReporter<std::io::Stdout> {
    pub fn stdout(pretty: bool) -> Self {
        Self::new(std::io::stdout(), pretty)
    }
}

impl<W: Write + Send> JsonReporter<W> {
    pub fn new(out: W, pretty: bool) -> Self {
        Self {
            out: Mutex::new(out),
            pretty,
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

#[async_trait]
impl<R, W> Reporter<R> for JsonReporter<W>
where
    R: Serialize + Debug + Sync,
    W: Write + Send,
{
    async fn report(&self, report: &R) -> Result<(), Error> {
        let json = if self.pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        let mut out = self.out.lock();
        writeln!(out, "{json}")?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TaskSummary;

    fn sample() -> RunReport {
        RunReport::new(
            "sequential",
            ConcurrencyMode::None,
            Duration::from_millis(1234),
            vec![TaskEntry::Completed(TaskSummary::new(0, 1.0, "w"))],
        )
    }

    #[test]
    fn duration_rounded_to_millis() {
        let report = RunReport::new(
            "x",
            ConcurrencyMode::Async,
            Duration::from_micros(1_234_567),
            vec![],
        );
        assert_eq!(report.duration_seconds, 1.235);
    }

    #[test]
    fn optional_sections_are_omitted() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["strategy"], "sequential");
        assert_eq!(json["items_processed"], 1);
        assert_eq!(json["concurrency"], "none");
        assert!(json.get("shared_counter").is_none());
        assert!(json.get("store_stats").is_none());
    }

    #[test]
    fn parallel_sections_are_serialized() {
        let mut report = sample();
        report.concurrency = ConcurrencyMode::Parallel;
        report.max_concurrency = Some(5);
        report.shared_counter = Some(7);
        report.store_stats = Some(StoreStats {
            total_items: 7,
            operations: 7,
        });
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["concurrency"], "parallel");
        assert_eq!(json["max_concurrency"], 5);
        assert_eq!(json["shared_counter"], 7);
        assert_eq!(json["store_stats"]["operations"], 7);
    }

    #[tokio::test]
    async fn json_reporter_writes_one_line_per_report() {
        let reporter = JsonReporter::new(Vec::new(), false);
        reporter.report(&sample()).await.unwrap();
        reporter.report(&sample()).await.unwrap();

        let written = String::from_utf8(reporter.into_inner()).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: RunReport = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed, sample());
    }
}
