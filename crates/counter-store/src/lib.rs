//! Shared atomic counter store for corpus-scale workers.
//!
//! Workers are independent processes sharing no memory; the only shared
//! mutable state is what lives behind the [`CounterStore`] trait. The two
//! operations requiring cross-worker atomicity, add-if-absent and
//! increment, must be single round trips that are atomic on the backing
//! store, never client-side check-then-act.
//!
//! # Architecture
//!
//! This crate provides:
//! - The [`CounterStore`] trait over any store offering atomic
//!   add-if-absent and atomic increment
//! - [`MemoryStore`] - process-local backend for tests and dry runs
//! - [`MongoCounterStore`] - networked backend with server-side atomicity
//!
//! # Failure semantics
//!
//! Transport failures surface as [`StoreError::Unavailable`]; this crate
//! performs no retries itself. Retry policy belongs to the caller, which
//! may prefer failing the whole run over risking inconsistent counters.

mod memory;
mod mongodb;
pub mod store;

// Re-export store trait and types
pub use store::{CounterStore, StoreError, StoreValue};

// Re-export backends
pub use crate::mongodb::MongoCounterStore;
pub use memory::MemoryStore;
