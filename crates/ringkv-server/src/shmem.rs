use crate::errors::ServerError;
use std::fs::OpenOptions;
use std::os::unix::io::AsRawFd;
use std::path::Path;

/// A shared-memory mapping opened over an existing file.
///
/// The file is never created or resized here (spec.md §6): the caller
/// that sets up `SHM_PATH` is responsible for sizing it to hold at least
/// one `Ring<N>`.
pub struct SharedMemory {
    base: *mut u8,
    len: usize,
}

impl SharedMemory {
    /// Opens `path` read-write and maps its entire contents.
    pub fn open(path: &Path, required_len: usize) -> Result<Self, ServerError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| ServerError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        let metadata = file.metadata().map_err(|source| ServerError::Metadata {
            path: path.to_path_buf(),
            source,
        })?;
        let len = metadata.len();

        if len < required_len as u64 {
            return Err(ServerError::TooSmall {
                path: path.to_path_buf(),
                actual: len,
                required: required_len as u64,
            });
        }

        // SAFETY: `file` stays open for the duration of this call and its
        // descriptor is valid; `mmap` either returns a usable pointer or
        // `MAP_FAILED`, both handled below.
        let addr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                len as usize,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                0,
            )
        };

        if addr == libc::MAP_FAILED {
            return Err(ServerError::Mmap {
                path: path.to_path_buf(),
                errno: std::io::Error::last_os_error().raw_os_error().unwrap_or(-1),
            });
        }

        Ok(Self {
            base: addr.cast::<u8>(),
            len: len as usize,
        })
    }

    pub fn base(&self) -> *mut u8 {
        self.base
    }

    pub fn len(&self) -> usize {
        self.len
    }
}

impl Drop for SharedMemory {
    fn drop(&mut self) {
        // SAFETY: `self.base`/`self.len` describe exactly the region this
        // `SharedMemory` mapped in `open` and nothing else aliases it past
        // this point.
        unsafe {
            libc::munmap(self.base.cast(), self.len);
        }
    }
}

// SAFETY: the mapped region is shared memory by construction; callers
// synchronize access to it through the ring and hash table's own atomics.
unsafe impl Send for SharedMemory {}
unsafe impl Sync for SharedMemory {}
