//! Counter store trait and shared types.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Value stored under a key: an integer counter or an opaque serialized
/// body.
///
/// No framing is defined beyond what the backing store natively round
/// trips: integers for counters, strings for bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreValue {
    /// An atomically mutable integer.
    Counter(i64),
    /// An opaque serialized document body.
    Body(String),
}

impl StoreValue {
    /// The counter value, if this is a counter.
    pub fn as_counter(&self) -> Option<i64> {
        match self {
            StoreValue::Counter(value) => Some(*value),
            StoreValue::Body(_) => None,
        }
    }

    /// The body content, if this is a body.
    pub fn as_body(&self) -> Option<&str> {
        match self {
            StoreValue::Counter(_) => None,
            StoreValue::Body(body) => Some(body),
        }
    }
}

/// Errors surfaced by counter store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backing store unreachable or the operation timed out.
    #[error("Counter store unavailable: {0}")]
    Unavailable(String),

    /// Increment attempted on a key that was never initialized.
    #[error("Key not initialized: {0}")]
    NotFound(String),

    /// Integer operation attempted on a non-counter value.
    #[error("Value under key '{key}' is not a counter")]
    NotACounter { key: String },

    /// A stored value could not be decoded as either a counter or a body.
    #[error("Malformed value under key '{key}'")]
    Malformed { key: String },
}

/// Capability interface over a shared key-value service offering atomic
/// add-if-absent, point and bulk reads, and atomic increment.
///
/// Implementations must make [`add_if_absent`](CounterStore::add_if_absent)
/// and [`increment`](CounterStore::increment) atomic with respect to
/// concurrent callers on the backing store itself; these are the only two
/// operations the cross-worker coordination contract depends on.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Set `key` to `initial` only if the key does not exist yet, returning
    /// whether the set took effect.
    ///
    /// When two callers race, exactly one observes `true` and both
    /// ultimately observe the same stored value. This is the primitive that
    /// makes multi-process initialization idempotent without a leader
    /// election.
    async fn add_if_absent(&self, key: &str, initial: StoreValue) -> Result<bool, StoreError>;

    /// Point read. A missing key is `Ok(None)`, distinct from a zero
    /// counter or an empty body.
    async fn get(&self, key: &str) -> Result<Option<StoreValue>, StoreError>;

    /// Best-effort batched read. Keys with no value are omitted from the
    /// result, never an error by themselves.
    async fn get_bulk(&self, keys: &[String]) -> Result<HashMap<String, StoreValue>, StoreError>;

    /// Atomically add `step` to the counter under `key` and return the new
    /// value.
    ///
    /// Fails with [`StoreError::NotFound`] if the key was never initialized
    /// via [`add_if_absent`](CounterStore::add_if_absent); callers must
    /// initialize first.
    async fn increment(&self, key: &str, step: i64) -> Result<i64, StoreError>;

    /// Unconditional overwrite, used only for non-counter writes such as
    /// template bodies. Overwrite races are acceptable there because
    /// bodies are write-once-per-key in practice.
    async fn set(&self, key: &str, value: StoreValue) -> Result<(), StoreError>;
}
