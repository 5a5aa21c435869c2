use parking_lot::Mutex;

/// A process-wide execution counter.
///
/// Every read-modify-write happens under one short lock that is never held
/// across a wait or an `.await`, so concurrent callers can lose no updates and
/// never observe the same post-increment value twice.
#[derive(Debug, Default)]
pub struct SynchronizedCounter {
    value: Mutex<u64>,
}

impl SynchronizedCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one and return the new value.
    pub fn increment(&self) -> u64 {
        let mut value = self.value.lock();
        *value += 1;
        *value
    }

    /// Current value.
    pub fn snapshot(&self) -> u64 {
        *self.value.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn increment_returns_new_value() {
        let counter = SynchronizedCounter::new();
        assert_eq!(counter.snapshot(), 0);
        assert_eq!(counter.increment(), 1);
        assert_eq!(counter.increment(), 2);
        assert_eq!(counter.snapshot(), 2);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let counter = SynchronizedCounter::new();
        let threads = 8;
        let per_thread = 1_000;

        let seen: Vec<u64> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..threads)
                .map(|_| s.spawn(|| (0..per_thread).map(|_| counter.increment()).collect::<Vec<_>>()))
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        });

        assert_eq!(counter.snapshot(), (threads * per_thread) as u64);
        // no two callers saw the same value
        let unique: HashSet<u64> = seen.iter().copied().collect();
        assert_eq!(unique.len(), seen.len());
    }
}
