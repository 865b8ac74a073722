/// Request kind carried by a `BufferDescriptor` (spec.md §6): `0` is a
/// write, `1` is a read. Kept as a bare `u32` rather than an enum so the
/// wire layout matches the original's `int req_type` field exactly;
/// `ReqType` gives callers symbolic names without changing the repr.
pub mod req_type {
    pub const PUT: u32 = 0;
    pub const GET: u32 = 1;
}

/// One ring slot: a request in flight plus where to deposit its result.
///
/// `#[repr(C)]` and plain integer fields only, so this can be written and
/// read through a shared-memory mapping by any process that agrees on the
/// layout (spec.md §6).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct BufferDescriptor {
    pub req_type: u32,
    pub k: u32,
    pub v: u32,
    /// Byte offset, from the start of the shared-memory region, of the
    /// `BufferDescriptor` the caller is polling for a response.
    pub res_off: u32,
    /// `0` until the dispatcher has written a result, `1` after.
    pub ready: u8,
}

impl BufferDescriptor {
    pub fn put(key: u32, value: u32, res_off: u32) -> Self {
        Self {
            req_type: req_type::PUT,
            k: key,
            v: value,
            res_off,
            ready: 0,
        }
    }

    pub fn get(key: u32, res_off: u32) -> Self {
        Self {
            req_type: req_type::GET,
            k: key,
            v: 0,
            res_off,
            ready: 0,
        }
    }
}

/// Writes a dispatch result into the response slot at `res_off` within
/// `base`, then publishes it by storing `ready = 1` last.
///
/// `value` is written only for a GET's result; a PUT's response carries no
/// payload (spec.md §6, mirroring the original server's `res->v = ret`
/// only on the GET path).
///
/// # Safety
/// `base` must point to a live shared-memory mapping at least
/// `res_off + size_of::<BufferDescriptor>()` bytes long, and no other
/// thread may write to the same response slot concurrently.
pub unsafe fn write_response(base: *mut u8, res_off: u32, value: Option<u32>) {
    let slot = base.add(res_off as usize).cast::<BufferDescriptor>();
    if let Some(value) = value {
        (*slot).v = value;
    }
    // SAFETY: `ready` is a single byte at a stable offset inside
    // `BufferDescriptor`; treating it as an atomic for this one store
    // gives the polling reader a release boundary over the field writes
    // above without requiring the whole struct to be atomic.
    let ready = std::ptr::addr_of_mut!((*slot).ready).cast::<std::sync::atomic::AtomicU8>();
    (*ready).store(1, std::sync::atomic::Ordering::Release);
}
