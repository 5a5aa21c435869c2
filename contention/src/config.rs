//! TOML configuration.
//!
//! Every section and field is optional; anything missing falls back to the
//! reference values.
//!
//! ```toml
//! [limits]
//! max_items = 20
//! max_concurrency = 64
//!
//! [parallel]
//! max_concurrency = 5
//!
//! [workload]
//! intensity = 500000
//! io_wait_ms = 50
//! ```

use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Error},
    executor::bounded::DEFAULT_MAX_CONCURRENCY,
    workload::{DEFAULT_INTENSITY, DEFAULT_IO_WAIT, SimulatedWorkload},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub limits: Limits,
    pub parallel: ParallelSettings,
    pub workload: WorkloadSettings,
}

/// Bounds applied to every request before any work starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Limits {
    /// Largest accepted item count per run.
    pub max_items: usize,
    /// Largest accepted admission-token count.
    pub max_concurrency: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_items: 20,
            max_concurrency: 64,
        }
    }
}

impl Limits {
    pub fn check_items(&self, item_count: usize) -> Result<(), Error> {
        check_range("item_count", item_count, self.max_items)
    }

    pub fn check_concurrency(&self, max_concurrency: usize) -> Result<(), Error> {
        check_range("max_concurrency", max_concurrency, self.max_concurrency)
    }
}

fn check_range(what: &'static str, value: usize, max: usize) -> Result<(), Error> {
    if (1..=max).contains(&value) {
        Ok(())
    } else {
        Err(Error::ResourceExhaustion {
            what,
            value,
            min: 1,
            max,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParallelSettings {
    /// Admission tokens used when a caller does not ask for a specific number.
    pub max_concurrency: usize,
}

impl Default for ParallelSettings {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkloadSettings {
    pub intensity: u64,
    pub io_wait_ms: u64,
}

impl Default for WorkloadSettings {
    fn default() -> Self {
        Self {
            intensity: DEFAULT_INTENSITY,
            io_wait_ms: DEFAULT_IO_WAIT.as_millis() as u64,
        }
    }
}

impl WorkloadSettings {
    pub fn build(&self) -> SimulatedWorkload {
        SimulatedWorkload::builder()
            .intensity(self.intensity)
            .io_wait(Duration::from_millis(self.io_wait_ms))
            .build()
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            source,
            path: path.display().to_string(),
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_items == 0 {
            return Err(validation("limits.max_items must be at least 1"));
        }
        if self.limits.max_concurrency == 0 {
            return Err(validation("limits.max_concurrency must be at least 1"));
        }
        if self.parallel.max_concurrency == 0
            || self.parallel.max_concurrency > self.limits.max_concurrency
        {
            return Err(validation(format!(
                "parallel.max_concurrency must be between 1 and {}, got {}",
                self.limits.max_concurrency, self.parallel.max_concurrency
            )));
        }
        Ok(())
    }
}

fn validation(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}
