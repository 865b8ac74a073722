//! Lock-free hash table, cooperative grow protocol, and shared-memory ring
//! transport for a concurrent key-value store.
//!
//! The public surface is deliberately small: construct a [`Store`], feed
//! it `lookup`/`insert` calls directly, or hand it to a [`Server`] that
//! pulls requests off a [`Ring`] and writes results back through
//! [`descriptor::write_response`].

mod backoff;
mod config;
mod descriptor;
mod entry;
mod grow;
mod hash;
mod invariants;
mod metrics;
mod ring;
mod server;
mod table;

pub mod store;

pub use backoff::Backoff;
pub use config::TableConfig;
pub use descriptor::{req_type, write_response, BufferDescriptor};
pub use metrics::MetricsSnapshot;
pub use ring::Ring;
pub use server::Server;
pub use store::{InsertOutcome, Store};
