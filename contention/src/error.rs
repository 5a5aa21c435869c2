//! Error types for the comparator.
//!
//! [`Error`] is what a run entry point returns. Per-task problems never surface
//! here directly: they are captured as [`TaskError`]s in the task's own result
//! slot, and only bubble up as [`Error::AllTasksFailed`] when nothing succeeded.

use std::any::Any;

/// Errors that fail a whole invocation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Item count or concurrency bound outside the accepted range. Raised before
    /// any work is started.
    #[error("{what} must be between {min} and {max}, got {value}")]
    ResourceExhaustion {
        what: &'static str,
        value: usize,
        min: usize,
        max: usize,
    },

    /// Every task of the run failed.
    #[error("all {} tasks failed, first failure: {}", .failures.len(), .failures.first().map(String::as_str).unwrap_or("none"))]
    AllTasksFailed { failures: Vec<String> },

    /// The shared store's length and operation count disagree. This is a
    /// synchronization bug, never an expected outcome.
    #[error("store invariant violated: {total_items} items but {operations} operations")]
    InvariantViolation { total_items: usize, operations: u64 },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading or validating a [`Config`](crate::config::Config).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file is not valid TOML or does not match the expected schema.
    #[error("Failed to parse config TOML: {source}")]
    Parse {
        #[from]
        source: toml::de::Error,
    },

    /// The file could not be read.
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        source: std::io::Error,
        path: String,
    },

    /// Parsed fine, but the values make no sense together.
    #[error("Config validation error: {message}")]
    Validation { message: String },
}

/// A workload reporting that it could not produce a result for one task.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("workload failed for task {task_id}: {message}")]
pub struct WorkloadError {
    pub task_id: usize,
    pub message: String,
}

impl WorkloadError {
    pub fn new(task_id: usize, message: impl Into<String>) -> Self {
        Self {
            task_id,
            message: message.into(),
        }
    }
}

/// Why a single task has no result.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TaskError {
    #[error(transparent)]
    Workload(#[from] WorkloadError),

    /// The worker panicked. The admission token was still returned.
    #[error("worker panicked: {0}")]
    Panicked(String),

    /// The worker was cancelled before producing a result.
    #[error("worker aborted before completion")]
    Aborted,
}

impl TaskError {
    /// Build a `TaskError` from a failed blocking or async task join.
    pub(crate) fn from_join(err: tokio::task::JoinError) -> Self {
        if !err.is_panic() {
            return Self::Aborted;
        }
        Self::from_panic(err.into_panic())
    }

    /// Build a `TaskError` from a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked(message)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
