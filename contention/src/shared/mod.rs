//! Shared mutable state.
//!
//! The counter and the store are the only things workers of different tasks
//! ever write to. Rather than living in globals they hang off a [`SharedState`],
//! built once and handed to every run. Cloning it is cheap and every clone
//! points at the same counter and store.
pub mod counter;
pub mod store;

pub use counter::SynchronizedCounter;
pub use store::{SharedStore, StoreStats};

use std::sync::Arc;

use crate::record::TaskRecord;

#[derive(Debug, Clone, Default)]
pub struct SharedState {
    counter: Arc<SynchronizedCounter>,
    store: Arc<SharedStore<TaskRecord>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self) -> &SynchronizedCounter {
        &self.counter
    }

    pub fn store(&self) -> &SharedStore<TaskRecord> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_same_state() {
        let state = SharedState::new();
        let other = state.clone();
        other.counter().increment();
        other.store().append(TaskRecord::new(0, 0.0, "w"));
        assert_eq!(state.counter().snapshot(), 1);
        assert_eq!(state.store().len(), 1);
    }
}
