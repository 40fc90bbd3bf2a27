//! Template storage on top of the counter store.

use counter_store::{CounterStore, StoreError, StoreValue};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use synth_core::{template_key, TemplateDocument};
use thiserror::Error;

/// Errors from template reads and writes.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// Store-level failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A stored template body failed to parse as JSON.
    #[error("Malformed template body under key '{key}': {source}")]
    Malformed {
        key: String,
        source: serde_json::Error,
    },

    /// A counter was found where a template body was expected.
    #[error("Key '{key}' does not hold a template body")]
    NotABody { key: String },
}

/// Read/write access to the per-table template documents.
///
/// Templates are populated once during a dedicated preload phase before
/// concurrent synthesis begins; writes are last-write-wins and never
/// deduplicated here.
#[derive(Clone)]
pub struct TemplateCache {
    store: Arc<dyn CounterStore>,
}

impl TemplateCache {
    /// Create a cache over the given store.
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    /// Store a template body under `<table>:template:<id>`.
    pub async fn put_template(
        &self,
        table: &str,
        id: i64,
        body: &Value,
    ) -> Result<(), TemplateError> {
        let key = template_key(table, id);
        self.store
            .set(&key, StoreValue::Body(body.to_string()))
            .await?;
        Ok(())
    }

    /// Fetch one template. A never-stored id is `Ok(None)`.
    pub async fn get_template(
        &self,
        table: &str,
        id: i64,
    ) -> Result<Option<TemplateDocument>, TemplateError> {
        let key = template_key(table, id);
        match self.store.get(&key).await? {
            None => Ok(None),
            Some(StoreValue::Body(raw)) => {
                let body = serde_json::from_str(&raw)
                    .map_err(|source| TemplateError::Malformed { key, source })?;
                Ok(Some(TemplateDocument {
                    table: table.to_string(),
                    id,
                    body,
                }))
            }
            Some(StoreValue::Counter(_)) => Err(TemplateError::NotABody { key }),
        }
    }

    /// Fetch a batch of templates. Ids with no stored body are omitted.
    pub async fn get_bulk_templates(
        &self,
        table: &str,
        ids: &[i64],
    ) -> Result<HashMap<i64, TemplateDocument>, TemplateError> {
        let keys: Vec<String> = ids.iter().map(|id| template_key(table, *id)).collect();
        let values = self.store.get_bulk(&keys).await?;

        let mut templates = HashMap::with_capacity(values.len());
        for (id, key) in ids.iter().zip(&keys) {
            let Some(value) = values.get(key) else {
                continue;
            };
            match value {
                StoreValue::Body(raw) => {
                    let body =
                        serde_json::from_str(raw).map_err(|source| TemplateError::Malformed {
                            key: key.clone(),
                            source,
                        })?;
                    templates.insert(
                        *id,
                        TemplateDocument {
                            table: table.to_string(),
                            id: *id,
                            body,
                        },
                    );
                }
                StoreValue::Counter(_) => {
                    return Err(TemplateError::NotABody { key: key.clone() })
                }
            }
        }
        Ok(templates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use counter_store::MemoryStore;
    use serde_json::json;

    fn cache() -> (Arc<MemoryStore>, TemplateCache) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), TemplateCache::new(store))
    }

    #[tokio::test]
    async fn test_round_trip_preserves_body() {
        let (store, cache) = cache();
        let body = json!({ "id": 7, "type": "fire", "tags": ["a", "b"] });

        cache.put_template("incidents", 7, &body).await.unwrap();
        let fetched = cache.get_template("incidents", 7).await.unwrap().unwrap();

        assert_eq!(fetched.table, "incidents");
        assert_eq!(fetched.id, 7);
        assert_eq!(fetched.body, body);

        // The stored bytes are exactly the serialized body.
        let raw = store.get("incidents:template:7").await.unwrap().unwrap();
        assert_eq!(raw, StoreValue::Body(body.to_string()));
    }

    #[tokio::test]
    async fn test_missing_template_is_absent_not_error() {
        let (_, cache) = cache();
        assert!(cache.get_template("incidents", 999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bulk_fetch_omits_missing_ids() {
        let (_, cache) = cache();
        cache
            .put_template("incidents", 1, &json!({ "id": 1 }))
            .await
            .unwrap();
        cache
            .put_template("incidents", 3, &json!({ "id": 3 }))
            .await
            .unwrap();

        let templates = cache
            .get_bulk_templates("incidents", &[1, 2, 3])
            .await
            .unwrap();

        assert_eq!(templates.len(), 2);
        assert!(templates.contains_key(&1));
        assert!(!templates.contains_key(&2));
        assert_eq!(templates[&3].body, json!({ "id": 3 }));
    }

    #[tokio::test]
    async fn test_counter_under_template_key_is_an_error() {
        let (store, cache) = cache();
        store
            .set("incidents:template:1", StoreValue::Counter(5))
            .await
            .unwrap();

        let result = cache.get_template("incidents", 1).await;
        assert!(matches!(result, Err(TemplateError::NotABody { .. })));
    }

    #[tokio::test]
    async fn test_malformed_body_is_an_error() {
        let (store, cache) = cache();
        store
            .set(
                "incidents:template:1",
                StoreValue::Body("not json".to_string()),
            )
            .await
            .unwrap();

        let result = cache.get_template("incidents", 1).await;
        assert!(matches!(result, Err(TemplateError::Malformed { .. })));
    }
}
