use crate::descriptor::{req_type, write_response};
use crate::ring::Ring;
use crate::store::Store;
use tracing::debug;

/// The dispatch loop: pulls requests off a `Ring`, resolves them against a
/// `Store`, and writes results back into shared memory.
///
/// Generic over the ring's compile-time slot count so one binary can be
/// built against whatever `RING_SIZE` its deployment agreed on.
pub struct Server<const N: usize> {
    store: Store,
    ring: *const Ring<N>,
    response_base: *mut u8,
}

impl<const N: usize> Server<N> {
    /// # Safety
    /// `ring` must point at a `Ring<N>` that is fully initialized (see
    /// `Ring::at`) and `response_base` must point at the start of the same
    /// mapped region `ring` lives in, both valid for the lifetime of this
    /// `Server`. The two may overlap (a response slot may itself be a
    /// `BufferDescriptor` the ring also addresses) since
    /// `descriptor::write_response` only ever touches one slot at a time.
    pub unsafe fn new(store: Store, ring: *const Ring<N>, response_base: *mut u8) -> Self {
        Self {
            store,
            ring,
            response_base,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// # Safety
    /// Caller must uphold the same contract `new` documents for as long as
    /// this call runs: the ring and response region stay live and valid.
    pub unsafe fn run_dispatcher_worker(&self) -> ! {
        let ring = &*self.ring;
        loop {
            let request = ring.take();
            debug!(req_type = request.req_type, key = request.k, "request received");

            match request.req_type {
                req_type::GET => {
                    let value = self.store.lookup(request.k);
                    debug!(key = request.k, found = value.is_some(), "get");
                    // spec.md §4.4/§7: the `v` field is always overwritten on a
                    // GET, even on a miss, so a reused response slot can't leak
                    // a stale value under the not_found=0 sentinel contract.
                    write_response(self.response_base, request.res_off, Some(value.unwrap_or(0)));
                }
                req_type::PUT => {
                    let outcome = self.store.insert(request.k, request.v);
                    debug!(key = request.k, value = request.v, ?outcome, "put");
                    write_response(self.response_base, request.res_off, None);
                }
                other => {
                    tracing::warn!(req_type = other, "unrecognized request type, dropping");
                }
            }
        }
    }
}

// SAFETY: `Server` only reads its `ring`/`response_base` pointers and
// every write through them goes through the synchronized primitives in
// `ring` and `descriptor::write_response`; `Store` is itself `Send + Sync`.
unsafe impl<const N: usize> Send for Server<N> {}
unsafe impl<const N: usize> Sync for Server<N> {}
