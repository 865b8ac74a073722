use crate::invariants::{debug_assert_load_factor_bound, debug_assert_size_preserved};
use crate::table::Table;
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};
use std::sync::{Condvar, Mutex};

/// The single-byte latch described in spec.md §3/§4.2: `idle` or
/// `migrating`, flipped by exactly one inserter via test-and-set.
pub struct MigrationFlag {
    migrating: AtomicBool,
}

impl MigrationFlag {
    pub fn new() -> Self {
        Self {
            migrating: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn is_migrating(&self, order: Ordering) -> bool {
        self.migrating.load(order)
    }

    /// Attempts to become the migration leader. Returns `true` to exactly
    /// one caller among any number of concurrent attempts.
    fn try_become_leader(&self) -> bool {
        self.migrating
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn clear(&self) {
        self.migrating.store(false, Ordering::SeqCst);
    }
}

impl Default for MigrationFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// The writer barrier from spec.md §4.2: a condition-variable-style
/// primitive guarded by a single mutex. Inserters that see `migrating`
/// wait here; the grow leader wakes everyone exactly once after
/// installing the new table.
pub struct Barrier {
    lock: Mutex<()>,
    condition: Condvar,
}

impl Barrier {
    pub fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            condition: Condvar::new(),
        }
    }

    /// Blocks the calling inserter until `flag` reads idle.
    ///
    /// The mutex is acquired before the flag is checked and held across
    /// the wait, so a leader's `wake_all` (which also takes the mutex)
    /// cannot be missed between the check and the wait starting.
    pub fn wait_for_idle(&self, flag: &MigrationFlag) {
        if !flag.is_migrating(Ordering::SeqCst) {
            return;
        }
        let mut guard = self.lock.lock().unwrap();
        while flag.is_migrating(Ordering::SeqCst) {
            guard = self.condition.wait(guard).unwrap();
        }
    }

    fn wake_all(&self) {
        let _guard = self.lock.lock().unwrap();
        self.condition.notify_all();
    }
}

impl Default for Barrier {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the grow leader protocol (spec.md §4.2) to completion: allocates
/// a table of double the capacity, partitions `old`'s index range among
/// `workers` helper threads, waits for them to finish re-homing every
/// entry, installs the new table as active, clears the migration flag,
/// and wakes every inserter waiting on `barrier`.
///
/// The caller must already hold migration leadership (`flag` reads
/// `migrating`, set by this caller's own `try_become_leader`) before
/// calling this.
pub fn run(old: &Table, workers: usize, active: &AtomicPtr<Table>, flag: &MigrationFlag, barrier: &Barrier) {
    let old_capacity = old.capacity();
    let new_capacity = old_capacity * 2;
    let new_table = Table::new(new_capacity);

    let worker_count = workers.max(1);
    let chunk = old_capacity.div_ceil(worker_count).max(1);

    std::thread::scope(|scope| {
        for w in 0..worker_count {
            let start = w * chunk;
            if start >= old_capacity {
                break;
            }
            let end = ((w + 1) * chunk).min(old_capacity);
            let new_table = &new_table;
            scope.spawn(move || {
                old.rehome_range(start, end, new_table);
            });
        }
    });

    debug_assert_size_preserved!(old.size(), new_table.size());
    debug_assert_load_factor_bound!(new_table.size(), new_table.capacity());

    let new_ptr = Box::into_raw(Box::new(new_table));
    // The old table is intentionally leaked here, not freed: readers may
    // still be walking it (spec.md §9 "the source never frees it").
    active.store(new_ptr, Ordering::SeqCst);

    flag.clear();
    barrier.wake_all();
}

/// Attempts to claim migration leadership; returns `true` exactly once
/// for any number of concurrent callers observing the same trigger.
pub fn try_become_leader(flag: &MigrationFlag) -> bool {
    flag.try_become_leader()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leadership_is_exclusive() {
        let flag = MigrationFlag::new();
        assert!(try_become_leader(&flag));
        assert!(!try_become_leader(&flag));
        flag.clear();
        assert!(try_become_leader(&flag));
    }
}
