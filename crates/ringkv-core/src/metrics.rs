use std::sync::atomic::{AtomicU64, Ordering};

/// Running counters for a `Store`, kept as independent atomics rather than
/// behind a lock since none of them need to be observed together.
#[derive(Debug, Default)]
pub struct StoreMetrics {
    lookups: AtomicU64,
    inserts: AtomicU64,
    duplicates: AtomicU64,
    grows: AtomicU64,
}

impl StoreMetrics {
    pub(crate) fn record_lookup(&self) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_grow(&self) {
        self.grows.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lookups: self.lookups.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            grows: self.grows.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time read of `StoreMetrics`, plain data with no
/// synchronization of its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub lookups: u64,
    pub inserts: u64,
    pub duplicates: u64,
    pub grows: u64,
}
