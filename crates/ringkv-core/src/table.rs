use crate::entry::Entry;
use crate::hash::h;
use crate::invariants::debug_assert_size_monotonic;
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};
use std::sync::Arc;

/// One position in a backing array.
///
/// Transitions are empty -> occupied only (spec.md §3): an occupied
/// slot's entry is never replaced or cleared.
struct Slot {
    ptr: AtomicPtr<Entry>,
}

impl Slot {
    fn empty() -> Self {
        Self {
            ptr: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Reads the slot's current content.
    ///
    /// Returns a cloned `Arc` so the caller can inspect `key`/`value`
    /// without racing a concurrent publish into this same slot (which can
    /// never happen once non-empty, but can race the empty -> occupied
    /// transition itself).
    fn load(&self, order: Ordering) -> Option<Arc<Entry>> {
        let raw = self.ptr.load(order);
        if raw.is_null() {
            return None;
        }
        // SAFETY: once published, a slot's pointer is never replaced or
        // freed (entries live for the program's lifetime, spec.md §3/§9).
        // Reconstructing a temporary `Arc` to clone the reference count
        // and then forgetting it leaves the slot's own owning reference
        // untouched.
        let borrowed = unsafe { Arc::from_raw(raw) };
        let cloned = Arc::clone(&borrowed);
        std::mem::forget(borrowed);
        Some(cloned)
    }

    /// Attempts to publish `entry` into this slot if it is currently empty.
    ///
    /// On success the slot owns one strong reference to `entry`. On
    /// failure the `Arc` is handed back so the caller can retry without
    /// reallocating (spec.md §4.1 step 3: "re-read the same slot without
    /// advancing").
    fn try_publish(&self, entry: Arc<Entry>) -> Result<(), Arc<Entry>> {
        let raw = Arc::into_raw(entry) as *mut Entry;
        match self
            .ptr
            .compare_exchange(ptr::null_mut(), raw, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => Ok(()),
            Err(_) => {
                // SAFETY: raw was produced by the Arc::into_raw above and
                // the CAS failed, so it was never published anywhere else;
                // this is the only place that will ever reclaim it.
                Err(unsafe { Arc::from_raw(raw) })
            }
        }
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        let raw = *self.ptr.get_mut();
        if !raw.is_null() {
            // SAFETY: this slot owns exactly one strong reference to the
            // entry it published.
            drop(unsafe { Arc::from_raw(raw) });
        }
    }
}

// SAFETY: Slot only ever exposes its Entry through Arc clones produced
// under the synchronization described above.
unsafe impl Send for Slot {}
unsafe impl Sync for Slot {}

/// Outcome of one probe-and-publish attempt against a single `Table`.
pub enum InsertAttempt {
    Inserted,
    Duplicate,
    /// The migration flag flipped mid-walk; the caller must discard its
    /// entry and restart from the top of `Store::insert` (spec.md §4.1
    /// step 3).
    Aborted,
}

/// A backing array of `capacity` slots plus the count of occupied ones.
///
/// A `Table`'s length is logically immutable; growth produces a new
/// `Table` rather than resizing this one (spec.md §3).
pub struct Table {
    slots: Box<[Slot]>,
    size: AtomicUsize,
}

impl Table {
    pub fn new(capacity: usize) -> Self {
        let slots = (0..capacity).map(|_| Slot::empty()).collect();
        Self {
            slots,
            size: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size.load(Ordering::SeqCst)
    }

    /// Walks the probe sequence for `key`, returning its value if present.
    ///
    /// Never blocks; wait-free under lookup-only workloads (spec.md
    /// §4.1).
    pub fn lookup(&self, key: u32) -> Option<u32> {
        let capacity = self.capacity();
        let mut i = h(key, capacity);
        for _ in 0..capacity {
            match self.slots[i].load(Ordering::SeqCst) {
                None => return None,
                Some(entry) if entry.key == key => return Some(entry.value),
                Some(_) => {}
            }
            i = (i + 1) % capacity;
        }
        None
    }

    /// Probes from `h(entry.key, capacity)` and publishes `entry` into the
    /// first empty slot found, unless a slot already holds `entry.key`.
    ///
    /// `should_abort` is polled between probe steps so `Store::insert` can
    /// discard this attempt as soon as a migration starts mid-walk.
    pub fn try_insert(
        &self,
        mut entry: Arc<Entry>,
        mut should_abort: impl FnMut() -> bool,
    ) -> InsertAttempt {
        let key = entry.key;
        let capacity = self.capacity();
        let mut i = h(key, capacity);

        // Defensive bound: under the load-factor-below-one invariant this
        // always terminates well before `2 * capacity` total steps, even
        // accounting for same-slot CAS-failure retries that don't advance
        // `i` (spec.md §4.1 edge cases).
        for _ in 0..(2 * capacity + 1) {
            if should_abort() {
                return InsertAttempt::Aborted;
            }

            match self.slots[i].try_publish(entry) {
                Ok(()) => {
                    let old = self.size.fetch_add(1, Ordering::SeqCst);
                    debug_assert_size_monotonic!(old, old + 1);
                    return InsertAttempt::Inserted;
                }
                Err(rejected) => {
                    entry = rejected;
                    match self.slots[i].load(Ordering::SeqCst) {
                        Some(occupant) if occupant.key == key => {
                            return InsertAttempt::Duplicate;
                        }
                        Some(_) => {
                            i = (i + 1) % capacity;
                        }
                        None => {
                            // Lost the race to publish, but the slot is
                            // empty again only because we raced a CAS
                            // that hasn't landed yet from this thread's
                            // point of view; retry the same slot.
                        }
                    }
                }
            }
        }

        debug_assert!(false, "probe exceeded defensive bound; load factor invariant violated");
        InsertAttempt::Aborted
    }

    /// Re-homes every occupied slot in `[start, end)` into `new_table`,
    /// used by grow helper workers (spec.md §4.2 step 3). Workers never
    /// allocate new entries — they transfer the existing `Arc` reference.
    pub fn rehome_range(&self, start: usize, end: usize, new_table: &Table) {
        for i in start..end {
            if let Some(entry) = self.slots[i].load(Ordering::SeqCst) {
                let attempt = new_table.try_insert(entry, || false);
                debug_assert!(
                    matches!(attempt, InsertAttempt::Inserted),
                    "grow: rehomed entry failed to insert cleanly into the new table"
                );
            }
        }
    }
}
