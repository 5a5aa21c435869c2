use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{error::Error, record::Record};

/// Consistent view of a [`SharedStore`], both fields read under one lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_items: usize,
    pub operations: u64,
}

impl StoreStats {
    pub fn is_consistent(&self) -> bool {
        self.total_items as u64 == self.operations
    }
}

#[derive(Debug)]
struct Inner<R> {
    records: Vec<R>,
    operation_count: u64,
}

/// Append-only log of records.
///
/// Records are never mutated or removed. The length of the log and the
/// operation count move together inside the same critical section, so outside
/// of it `total_items == operations` always holds.
#[derive(Debug)]
pub struct SharedStore<R: Record> {
    inner: Mutex<Inner<R>>,
}

impl<R: Record> Default for SharedStore<R> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                records: Vec::new(),
                operation_count: 0,
            }),
        }
    }
}

impl<R: Record> SharedStore<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record.
    pub fn append(&self, record: R) {
        let total = {
            let mut inner = self.inner.lock();
            inner.records.push(record);
            inner.operation_count += 1;
            debug_assert_eq!(inner.records.len() as u64, inner.operation_count);
            inner.records.len()
        };
        tracing::debug!("Record added. Total items: {total}");
    }

    pub fn stats(&self) -> StoreStats {
        let inner = self.inner.lock();
        StoreStats {
            total_items: inner.records.len(),
            operations: inner.operation_count,
        }
    }

    /// [`stats`](Self::stats), failing loudly if the invariant does not hold.
    pub fn checked_stats(&self) -> Result<StoreStats, Error> {
        let stats = self.stats();
        if stats.is_consistent() {
            Ok(stats)
        } else {
            tracing::error!(
                total_items = stats.total_items,
                operations = stats.operations,
                "Shared store invariant violated"
            );
            Err(Error::InvariantViolation {
                total_items: stats.total_items,
                operations: stats.operations,
            })
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every record in append order.
    pub fn records(&self) -> Vec<R> {
        self.inner.lock().records.clone()
    }

    /// Bump the operation count without appending, breaking the store's
    /// invariant.
    #[cfg(test)]
    pub(crate) fn skew_operation_count(&self, extra: u64) {
        self.inner.lock().operation_count += extra;
    }
}
