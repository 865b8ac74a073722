use clap::Parser;
use std::path::PathBuf;

/// A concurrent key-value store fronted by a shared-memory ring.
///
/// Mirrors the original server's `-n`/`-s`/`-v`/`-h` flags (spec.md §6);
/// the shared-memory path is taken as an argument rather than hardcoded
/// so the same binary can be pointed at any mapped file.
#[derive(Debug, Parser)]
#[command(name = "ringkv-server", version, about)]
pub struct Args {
    /// Number of dispatcher threads. Also used as the number of helper
    /// threads fanned out to during a grow.
    #[arg(short = 'n', long = "threads", value_name = "N")]
    pub threads: usize,

    /// Initial hash table capacity. Bumped up to `threads` if smaller,
    /// since each dispatcher thread should have room to work.
    #[arg(short = 's', long = "size", value_name = "S")]
    pub initial_capacity: usize,

    /// Enable verbose request/response logging.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Path to the shared-memory-backed file mapping the ring transport.
    #[arg(value_name = "SHM_PATH")]
    pub shm_path: PathBuf,
}

impl Args {
    /// The effective initial table capacity after applying the `N > S`
    /// bump rule (spec.md §6).
    pub fn effective_capacity(&self) -> usize {
        self.initial_capacity.max(self.threads)
    }
}
