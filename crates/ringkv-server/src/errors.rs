use std::path::PathBuf;

/// Fatal startup errors. Anything in here is logged and ends the process;
/// there is no recovery path once the shared-memory mapping can't be
/// established.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to open shared-memory file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read metadata for shared-memory file {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("shared-memory file {path} is {actual} bytes, need at least {required}")]
    TooSmall {
        path: PathBuf,
        actual: u64,
        required: u64,
    },

    #[error("mmap failed for {path}: errno {errno}")]
    Mmap { path: PathBuf, errno: i32 },
}
