use crate::entry::Entry;
use crate::grow::{self, Barrier, MigrationFlag};
use crate::metrics::StoreMetrics;
use crate::table::{InsertAttempt, Table};
use std::sync::atomic::{AtomicPtr, Ordering};

/// The load factor that triggers a grow (spec.md §4.1 step 5).
const GROW_TRIGGER: f64 = 0.5;

/// Result of `Store::insert` (spec.md §4.1's "inserted | duplicate").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}

/// The lock-free hash table core plus its grow coordinator, bundled as
/// described in spec.md §9: one context value constructed at startup
/// rather than process-wide statics.
pub struct Store {
    active: AtomicPtr<Table>,
    migration: MigrationFlag,
    barrier: Barrier,
    grow_workers: usize,
    metrics: StoreMetrics,
}

impl Store {
    pub fn new(initial_capacity: usize, grow_workers: usize) -> Self {
        let table = Box::new(Table::new(initial_capacity.max(1)));
        Self {
            active: AtomicPtr::new(Box::into_raw(table)),
            migration: MigrationFlag::new(),
            barrier: Barrier::new(),
            grow_workers: grow_workers.max(1),
            metrics: StoreMetrics::default(),
        }
    }

    fn active_ptr(&self) -> *mut Table {
        self.active.load(Ordering::SeqCst)
    }

    /// # Safety
    /// Any pointer ever stored in `self.active` was produced by
    /// `Box::into_raw` and is never freed afterwards (tables live for the
    /// program's lifetime, spec.md §9), so dereferencing a snapshot taken
    /// from `self.active` is always valid.
    fn table_at<'a>(ptr: *mut Table) -> &'a Table {
        unsafe { &*ptr }
    }

    pub fn metrics(&self) -> crate::metrics::MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// spec.md §4.1 "Lookup algorithm": snapshot the active table, walk
    /// it, and restart against a fresh snapshot if the pointer moved out
    /// from under an "absent" result.
    pub fn lookup(&self, key: u32) -> Option<u32> {
        loop {
            let snapshot = self.active_ptr();
            let table = Self::table_at(snapshot);
            if let Some(value) = table.lookup(key) {
                self.metrics.record_lookup();
                return Some(value);
            }
            if self.active_ptr() == snapshot {
                self.metrics.record_lookup();
                return None;
            }
            // The active table changed mid-walk; a grow may have carried
            // an entry past where this walk saw "empty". Restart.
        }
    }

    /// spec.md §4.1 "Insert algorithm", steps 1-5.
    pub fn insert(&self, key: u32, value: u32) -> InsertOutcome {
        loop {
            // Step 1: wait out any in-progress migration.
            self.barrier.wait_for_idle(&self.migration);

            // Step 2: snapshot the active table and allocate the entry.
            let snapshot = self.active_ptr();
            let table = Self::table_at(snapshot);
            let entry = Entry::new(key, value);

            // Step 3: probe and publish, aborting if migration starts
            // mid-walk.
            let attempt = table.try_insert(entry, || self.migration.is_migrating(Ordering::SeqCst));

            match attempt {
                InsertAttempt::Aborted => continue,
                InsertAttempt::Duplicate => {
                    self.metrics.record_duplicate();
                    return InsertOutcome::Duplicate;
                }
                InsertAttempt::Inserted => {
                    self.metrics.record_insert();
                    // Step 5: trigger a grow once load factor crosses the
                    // threshold; whoever wins leadership runs it, everyone
                    // else returns immediately.
                    let load_factor = table.size() as f64 / table.capacity() as f64;
                    if load_factor > GROW_TRIGGER && grow::try_become_leader(&self.migration) {
                        self.metrics.record_grow();
                        grow::run(table, self.grow_workers, &self.active, &self.migration, &self.barrier);
                    }
                    return InsertOutcome::Inserted;
                }
            }
        }
    }

    /// Capacity of the currently active table (for diagnostics/tests).
    pub fn capacity(&self) -> usize {
        Self::table_at(self.active_ptr()).capacity()
    }

    /// Size of the currently active table (for diagnostics/tests).
    pub fn size(&self) -> usize {
        Self::table_at(self.active_ptr()).size()
    }
}

// SAFETY: all shared mutable state behind `Store` (the active table
// pointer, the migration flag, the barrier) is synchronized by the
// atomics and mutex/condvar described above.
unsafe impl Send for Store {}
unsafe impl Sync for Store {}
