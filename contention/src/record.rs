use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::TaskError;
use crate::macros::record;

/// Immutable values produced by workers and kept by the store or a report.
///
/// Implement it with the [`record`](crate::macros::record) attribute rather than
/// by hand.
pub trait Record
where
    Self: Serialize + DeserializeOwned + PartialEq + Send + Sync + Debug + Clone + 'static,
{
}

/// What a worker appends to the [`SharedStore`](crate::shared::SharedStore) after
/// finishing one task.
#[record]
pub struct TaskRecord {
    pub task_id: usize,
    pub result: f64,
    pub worker: String,
    pub timestamp: DateTime<Utc>,
}

impl TaskRecord {
    pub fn new(task_id: usize, result: f64, worker: impl Into<String>) -> Self {
        Self {
            task_id,
            result,
            worker: worker.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Per-task line of a [`RunReport`](crate::report::RunReport).
#[record]
pub struct TaskSummary {
    pub task_id: usize,
    /// Rounded to two decimals.
    pub result: f64,
    pub processed_by: String,
    /// Counter value observed right after this task's increment. Only strategies
    /// that touch shared state set it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_value: Option<u64>,
}

impl TaskSummary {
    pub fn new(task_id: usize, result: f64, processed_by: impl Into<String>) -> Self {
        Self {
            task_id,
            result: round_to(result, 2),
            processed_by: processed_by.into(),
            counter_value: None,
        }
    }

    pub fn with_counter(mut self, value: u64) -> Self {
        self.counter_value = Some(value);
        self
    }
}

/// A task that produced no result, and why.
#[record]
pub struct TaskFailure {
    pub task_id: usize,
    pub error: String,
}

/// Result slot of one task.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskEntry {
    Completed(TaskSummary),
    Failed(TaskFailure),
}

impl TaskEntry {
    pub fn failed(task_id: usize, error: &TaskError) -> Self {
        Self::Failed(TaskFailure {
            task_id,
            error: error.to_string(),
        })
    }

    pub fn task_id(&self) -> usize {
        match self {
            Self::Completed(s) => s.task_id,
            Self::Failed(f) => f.task_id,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn summary(&self) -> Option<&TaskSummary> {
        match self {
            Self::Completed(s) => Some(s),
            Self::Failed(_) => None,
        }
    }
}

/// Name of the thread currently executing, used as the worker identity.
pub fn worker_identity() -> String {
    let thread = std::thread::current();
    match thread.name() {
        Some(name) => format!("{name} ({:?})", thread.id()),
        None => format!("{:?}", thread.id()),
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
