//! In-process counter store for tests and dry runs.

use crate::store::{CounterStore, StoreError, StoreValue};
use async_trait::async_trait;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Counter store backed by a process-local map.
///
/// The mutex around the map gives this backend the same atomicity the
/// trait demands of networked ones, scoped to a single process. Counters
/// are therefore only shared between workers that share this instance.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, StoreValue>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the store holds no keys.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn add_if_absent(&self, key: &str, initial: StoreValue) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().await;
        match entries.entry(key.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(vacant) => {
                vacant.insert(initial);
                Ok(true)
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Option<StoreValue>, StoreError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn get_bulk(&self, keys: &[String]) -> Result<HashMap<String, StoreValue>, StoreError> {
        let entries = self.entries.lock().await;
        Ok(keys
            .iter()
            .filter_map(|key| entries.get(key).map(|value| (key.clone(), value.clone())))
            .collect())
    }

    async fn increment(&self, key: &str, step: i64) -> Result<i64, StoreError> {
        let mut entries = self.entries.lock().await;
        match entries.get_mut(key) {
            None => Err(StoreError::NotFound(key.to_string())),
            Some(StoreValue::Body(_)) => Err(StoreError::NotACounter {
                key: key.to_string(),
            }),
            Some(StoreValue::Counter(value)) => {
                *value += step;
                Ok(*value)
            }
        }
    }

    async fn set(&self, key: &str, value: StoreValue) -> Result<(), StoreError> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}
