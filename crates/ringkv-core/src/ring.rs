//! The shared-memory ring transport (spec.md §5), grounded directly in
//! `ring_buffer.c`'s two-cursor producer/consumer protocol: a wait-free
//! slot claim (CAS on `p_head`/`c_head`) followed by an ordered publish
//! (CAS-advance `p_tail`/`c_tail` in claim order) so that a consumer never
//! observes a claimed-but-not-yet-written slot.

use crate::backoff::Backoff;
use crate::descriptor::BufferDescriptor;
use crate::invariants::debug_assert_ring_bounded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU32, Ordering};

/// A fixed-capacity, `#[repr(C)]` multi-producer/multi-consumer ring of
/// `N` `BufferDescriptor` slots.
///
/// `N` is a compile-time constant so the layout matches a C
/// `struct ring { ...; struct buffer_descriptor buffer[RING_SIZE]; }`
/// exactly, with no length field to keep in sync across languages.
#[repr(C)]
pub struct Ring<const N: usize> {
    p_head: AtomicU32,
    p_tail: AtomicU32,
    c_head: AtomicU32,
    c_tail: AtomicU32,
    buffer: [UnsafeCell<MaybeUninit<BufferDescriptor>>; N],
}

// SAFETY: every slot is only ever touched between its claim (CAS on
// p_head/c_head) and its publish (CAS-advance on p_tail/c_tail), and the
// two cursors make those windows disjoint across producers and across
// consumers.
unsafe impl<const N: usize> Send for Ring<N> {}
unsafe impl<const N: usize> Sync for Ring<N> {}

impl<const N: usize> Ring<N> {
    const CAPACITY_CHECK: () = assert!(N > 1, "ring capacity must hold at least 2 slots");

    /// Heap-allocates a fresh, empty ring. Used by tests and by any
    /// in-process caller that does not need shared-memory placement.
    pub fn new_boxed() -> Box<Self> {
        let () = Self::CAPACITY_CHECK;
        Box::new(Self {
            p_head: AtomicU32::new(0),
            p_tail: AtomicU32::new(0),
            c_head: AtomicU32::new(0),
            c_tail: AtomicU32::new(0),
            buffer: std::array::from_fn(|_| UnsafeCell::new(MaybeUninit::uninit())),
        })
    }

    /// Reinterprets an existing, already-zeroed region of shared memory as
    /// a `Ring`.
    ///
    /// # Safety
    /// `base` must point to a mapping at least `size_of::<Ring<N>>()`
    /// bytes long, zero-initialized (so the cursors start at `0` and the
    /// buffer slots start logically empty, matching `init_ring`'s
    /// `memset`), properly aligned for `Ring<N>`, and live for at least
    /// `'a`. No other code may construct an overlapping `&mut` reference
    /// into the same bytes for that lifetime.
    pub unsafe fn at<'a>(base: *mut u8) -> &'a Self {
        let () = Self::CAPACITY_CHECK;
        &*base.cast::<Self>()
    }

    /// Slot count. Capacity for in-flight (claimed-but-unconsumed)
    /// requests is `N - 1`: the original design, like most circular
    /// buffers, sacrifices one slot so `head == tail` can mean "empty"
    /// without a separate counter.
    pub const fn len(&self) -> usize {
        N
    }

    /// Claims the next slot, writes `descriptor` into it, and publishes it
    /// in claim order. Blocks the calling thread with `Backoff` while the
    /// ring is full, exactly like the original's `sched_yield` spin.
    pub fn submit(&self, descriptor: BufferDescriptor) {
        let mut backoff = Backoff::new();
        let mut p_head = self.p_head.load(Ordering::SeqCst);
        let claimed = loop {
            let p_next = (p_head + 1) % N as u32;

            while p_next == self.c_tail.load(Ordering::SeqCst) {
                backoff.snooze();
            }

            match self
                .p_head
                .compare_exchange(p_head, p_next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => break p_head,
                Err(observed) => {
                    p_head = observed;
                    backoff.reset();
                }
            }
        };

        let occupancy = (claimed.wrapping_sub(self.c_tail.load(Ordering::SeqCst))) as usize % N;
        debug_assert_ring_bounded!(occupancy, N);

        // SAFETY: this slot was exclusively claimed by the CAS above; no
        // other producer holds it, and the consumer side cannot reach it
        // until p_tail is advanced past it below.
        unsafe {
            (*self.buffer[claimed as usize].get()).write(descriptor);
        }

        let p_next = (claimed + 1) % N as u32;
        let mut backoff = Backoff::new();
        while self
            .p_tail
            .compare_exchange(claimed, p_next, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            backoff.snooze();
        }
    }

    /// Claims the next published slot, reads it, and advances the
    /// consumer tail in claim order. Blocks the calling thread with
    /// `Backoff` while the ring is empty.
    pub fn take(&self) -> BufferDescriptor {
        let mut backoff = Backoff::new();
        let claimed = loop {
            let c_head = self.c_head.load(Ordering::SeqCst);
            let c_next = (c_head + 1) % N as u32;

            while c_head == self.p_tail.load(Ordering::SeqCst) {
                backoff.snooze();
            }

            match self
                .c_head
                .compare_exchange(c_head, c_next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => break c_head,
                Err(_) => backoff.reset(),
            }
        };

        // SAFETY: this slot was exclusively claimed by the CAS above, and
        // it was published by a producer (p_tail passed it) before this
        // loop's emptiness check could succeed.
        let descriptor = unsafe { (*self.buffer[claimed as usize].get()).assume_init_read() };

        let c_next = (claimed + 1) % N as u32;
        let mut backoff = Backoff::new();
        loop {
            if self
                .c_tail
                .compare_exchange(claimed, c_next, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                break;
            }
            backoff.snooze();
        }

        descriptor
    }
}
