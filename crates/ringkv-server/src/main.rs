mod cli;
mod errors;
mod shmem;

use clap::Parser;
use cli::Args;
use errors::ServerError;
use ringkv_core::{Ring, Server, Store, TableConfig};
use shmem::SharedMemory;
use std::sync::Arc;
use tracing::{error, info};

/// Fixed ring capacity for this binary. The original server fixed
/// `RING_SIZE` at compile time too; this is the Rust equivalent of that
/// constant rather than something the CLI configures (spec.md §5).
const RING_SIZE: usize = 1024;

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();
}

fn run(args: Args) -> Result<(), ServerError> {
    info!(threads = args.threads, size = args.initial_capacity, "Init Complete");

    let shmem = SharedMemory::open(&args.shm_path, std::mem::size_of::<Ring<RING_SIZE>>())?;

    // SAFETY: `SharedMemory::open` validated the region is at least
    // `size_of::<Ring<RING_SIZE>>()` bytes; the caller that prepared
    // `shm_path` is responsible for zero-initializing it, matching the
    // original's `init_ring` memset contract.
    let ring: &'static Ring<RING_SIZE> = unsafe { Ring::at(shmem.base()) };

    let config = TableConfig::new(args.effective_capacity(), args.threads);
    let store = Store::new(config.initial_capacity, config.grow_workers);

    // SAFETY: `ring` points into `shmem`'s mapping, which outlives every
    // dispatcher thread spawned below (it's moved into `server` and kept
    // alive by the `Arc` each thread holds); `shmem.base()` is the start of
    // that same mapping, so response offsets inside it are always in
    // bounds for any descriptor the ring itself produced.
    let server = unsafe { Server::new(store, ring as *const Ring<RING_SIZE>, shmem.base()) };
    let server = Arc::new((server, shmem));

    info!("Starting Threads");
    let mut handles = Vec::with_capacity(args.threads);
    for _ in 0..args.threads {
        let server = Arc::clone(&server);
        handles.push(std::thread::spawn(move || {
            // SAFETY: the mapping held alive by `server.1` (the
            // `SharedMemory`) is the same one `server.0` was constructed
            // over, and it stays alive as long as this `Arc` does.
            unsafe { server.0.run_dispatcher_worker() }
        }));
    }

    info!("Main Waiting");
    for handle in handles {
        if handle.join().is_err() {
            error!("dispatcher thread panicked");
        }
    }

    Ok(())
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(err) = run(args) {
        error!(%err, "fatal error during startup");
        std::process::exit(1);
    }
}
