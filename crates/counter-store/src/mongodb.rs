//! MongoDB-backed counter store.
//!
//! One document per key, with the key string as `_id`. Counters live in the
//! `counter` field and template bodies in the `body` field. Add-if-absent
//! rides on the unique `_id` index (a duplicate-key error means another
//! caller won the race); increment is a single-document `$inc` returning
//! the post-image. Both are one server round trip and atomic under
//! MongoDB's single-document guarantees.

use crate::store::{CounterStore, StoreError, StoreValue};
use async_trait::async_trait;
use bson::{doc, Document};
use futures::TryStreamExt;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection};
use std::collections::HashMap;
use tracing::debug;

/// MongoDB server error code for duplicate-key violations.
const DUPLICATE_KEY: i32 = 11000;

/// Counter store backed by a MongoDB collection.
pub struct MongoCounterStore {
    collection: Collection<Document>,
}

impl MongoCounterStore {
    /// Connect to `uri` and keep all keys in `database`.`collection`.
    ///
    /// Fails with [`StoreError::Unavailable`] when the store cannot be
    /// reached; callers are expected to abort rather than start a worker
    /// without counters.
    pub async fn connect(
        uri: &str,
        database: &str,
        collection: &str,
    ) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await.map_err(transport)?;
        let database = client.database(database);

        // Test connection
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(transport)?;

        debug!("Connected to counter store at {uri}");
        Ok(Self {
            collection: database.collection::<Document>(collection),
        })
    }

    /// Wrap an existing collection handle.
    pub fn with_collection(collection: Collection<Document>) -> Self {
        Self { collection }
    }

    fn value_document(key: &str, value: &StoreValue) -> Document {
        match value {
            StoreValue::Counter(counter) => doc! { "_id": key, "counter": *counter },
            StoreValue::Body(body) => doc! { "_id": key, "body": body.as_str() },
        }
    }

    fn decode(key: &str, document: &Document) -> Result<StoreValue, StoreError> {
        if let Ok(counter) = document.get_i64("counter") {
            return Ok(StoreValue::Counter(counter));
        }
        if let Ok(counter) = document.get_i32("counter") {
            return Ok(StoreValue::Counter(counter.into()));
        }
        if let Ok(body) = document.get_str("body") {
            return Ok(StoreValue::Body(body.to_string()));
        }
        Err(StoreError::Malformed {
            key: key.to_string(),
        })
    }
}

#[async_trait]
impl CounterStore for MongoCounterStore {
    async fn add_if_absent(&self, key: &str, initial: StoreValue) -> Result<bool, StoreError> {
        match self
            .collection
            .insert_one(Self::value_document(key, &initial))
            .await
        {
            Ok(_) => Ok(true),
            Err(error) if is_duplicate_key(&error) => Ok(false),
            Err(error) => Err(transport(error)),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<StoreValue>, StoreError> {
        let found = self
            .collection
            .find_one(doc! { "_id": key })
            .await
            .map_err(transport)?;
        match found {
            Some(document) => Ok(Some(Self::decode(key, &document)?)),
            None => Ok(None),
        }
    }

    async fn get_bulk(&self, keys: &[String]) -> Result<HashMap<String, StoreValue>, StoreError> {
        let mut cursor = self
            .collection
            .find(doc! { "_id": { "$in": keys.to_vec() } })
            .await
            .map_err(transport)?;

        let mut values = HashMap::new();
        while let Some(document) = cursor.try_next().await.map_err(transport)? {
            let key = document
                .get_str("_id")
                .map_err(|_| StoreError::Malformed {
                    key: "<unknown>".to_string(),
                })?
                .to_string();
            let value = Self::decode(&key, &document)?;
            values.insert(key, value);
        }
        Ok(values)
    }

    async fn increment(&self, key: &str, step: i64) -> Result<i64, StoreError> {
        // The counter-field filter keeps $inc from materializing a counter
        // on a key that holds a body or was never initialized.
        let updated = self
            .collection
            .find_one_and_update(
                doc! { "_id": key, "counter": { "$exists": true } },
                doc! { "$inc": { "counter": step } },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(transport)?;

        let document = updated.ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        match Self::decode(key, &document)? {
            StoreValue::Counter(value) => Ok(value),
            StoreValue::Body(_) => Err(StoreError::NotACounter {
                key: key.to_string(),
            }),
        }
    }

    async fn set(&self, key: &str, value: StoreValue) -> Result<(), StoreError> {
        self.collection
            .replace_one(doc! { "_id": key }, Self::value_document(key, &value))
            .upsert(true)
            .await
            .map_err(transport)?;
        Ok(())
    }
}

fn transport(error: mongodb::error::Error) -> StoreError {
    StoreError::Unavailable(error.to_string())
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    match &*error.kind {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY
        }
        _ => false,
    }
}
