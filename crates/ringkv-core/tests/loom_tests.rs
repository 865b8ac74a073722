//! Loom-based concurrency tests.
//!
//! Run with: `cargo test --features loom --test loom_tests --release`
//!
//! These model the two CAS protocols at the heart of the store in
//! isolation, using loom's own atomic types (not the crate's real types,
//! which use `std::sync` directly) so loom can exhaustively explore their
//! interleavings instead of just the handful this process happens to hit.

#![cfg(feature = "loom")]

use loom::sync::atomic::{AtomicBool, AtomicPtr, Ordering};
use loom::sync::Arc;
use loom::thread;
use std::ptr;

/// Mirrors `table::Slot`'s empty -> occupied CAS without pulling in `Arc`
/// bookkeeping loom doesn't model: a published slot just stores a
/// non-null sentinel.
struct LoomSlot {
    ptr: AtomicPtr<u8>,
}

impl LoomSlot {
    fn empty() -> Self {
        Self {
            ptr: AtomicPtr::new(ptr::null_mut()),
        }
    }

    fn try_publish(&self, value: *mut u8) -> bool {
        self.ptr
            .compare_exchange(ptr::null_mut(), value, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

unsafe impl Send for LoomSlot {}
unsafe impl Sync for LoomSlot {}

/// Two concurrent publishers racing for the same slot: exactly one must
/// win, regardless of interleaving.
#[test]
fn loom_slot_publish_is_exclusive() {
    loom::model(|| {
        let slot = Arc::new(LoomSlot::empty());
        let mut sentinel_a = 1u8;
        let mut sentinel_b = 2u8;
        let a_ptr = ptr::addr_of_mut!(sentinel_a);
        let b_ptr = ptr::addr_of_mut!(sentinel_b);

        let slot_a = Arc::clone(&slot);
        let t1 = thread::spawn(move || slot_a.try_publish(a_ptr));

        let slot_b = Arc::clone(&slot);
        let t2 = thread::spawn(move || slot_b.try_publish(b_ptr));

        let won_a = t1.join().unwrap();
        let won_b = t2.join().unwrap();

        assert!(
            won_a ^ won_b,
            "exactly one concurrent publish to an empty slot must win"
        );
    });
}

/// Mirrors `grow::MigrationFlag`'s test-and-set leadership claim.
struct LoomMigrationFlag {
    migrating: AtomicBool,
}

impl LoomMigrationFlag {
    fn new() -> Self {
        Self {
            migrating: AtomicBool::new(false),
        }
    }

    fn try_become_leader(&self) -> bool {
        self.migrating
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

#[test]
fn loom_migration_leadership_is_exclusive() {
    loom::model(|| {
        let flag = Arc::new(LoomMigrationFlag::new());

        let f1 = Arc::clone(&flag);
        let t1 = thread::spawn(move || f1.try_become_leader());
        let f2 = Arc::clone(&flag);
        let t2 = thread::spawn(move || f2.try_become_leader());

        let leader_1 = t1.join().unwrap();
        let leader_2 = t2.join().unwrap();

        assert!(
            leader_1 ^ leader_2,
            "exactly one of two concurrent migration leadership attempts must win"
        );
    });
}
