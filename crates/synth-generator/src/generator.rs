//! The orchestrating document generator.

use crate::offset::{offset_handles, PassAdvancer, SharedOffset};
use crate::templates::{TemplateCache, TemplateError};
use counter_store::{CounterStore, StoreError, StoreValue};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use synth_core::{
    counter_key, CorpusSchema, CounterKind, SynthesizedDocument, TemplateDocument,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Errors from generator orchestration.
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// Store-level failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Template-level failure.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Table not declared in the corpus schema.
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Operation attempted before initialization completed for the table.
    #[error("Table '{0}' is not initialized")]
    TableNotReady(String),

    /// A counter was still absent after an add-if-absent attempt.
    #[error("Counter '{key}' missing after initialization of table '{table}'")]
    InitIncomplete { table: String, key: String },
}

/// Lifecycle of a table's counters as observed by this process.
///
/// The store is the ground truth; this state only tracks how far the
/// local process has confirmed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    /// No counters confirmed in the store yet.
    Uninitialized,
    /// An initialization attempt is in flight.
    Initializing,
    /// All three counters confirmed present; terminal steady state.
    Ready,
}

#[derive(Debug, Clone, Copy)]
struct TableRuntime {
    state: TableState,
    /// Originals observed in the store, fixed once `Ready`.
    total_docs: i64,
}

/// Per-table synthesis progress, read straight from the shared counters.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TableProgress {
    /// Documents synthesized and stored so far.
    pub stored: i64,
    /// Count of real template documents.
    pub total: i64,
}

impl TableProgress {
    /// Stored-to-total ratio, zero when no templates exist.
    pub fn ratio(&self) -> f64 {
        if self.total > 0 {
            self.stored as f64 / self.total as f64
        } else {
            0.0
        }
    }
}

/// Coordinates identifier allocation and document synthesis across any
/// number of workers that share nothing but the counter store.
///
/// Constructing a generator also yields the process's [`PassAdvancer`];
/// the generator itself can only read the offset, so a worker compiled
/// against this crate cannot advance the pass numbering by accident.
pub struct DocumentGenerator {
    store: Arc<dyn CounterStore>,
    templates: TemplateCache,
    schema: CorpusSchema,
    offset: SharedOffset,
    tables: Mutex<HashMap<String, TableRuntime>>,
}

impl DocumentGenerator {
    /// Create a generator over the given store and schema.
    pub fn new(store: Arc<dyn CounterStore>, schema: CorpusSchema) -> (Self, PassAdvancer) {
        let (offset, advancer) = offset_handles(synth_core::SynthesisOffset::new(schema.max_col));
        let generator = Self {
            templates: TemplateCache::new(store.clone()),
            store,
            schema,
            offset,
            tables: Mutex::new(HashMap::new()),
        };
        (generator, advancer)
    }

    /// The template cache used by this generator.
    pub fn templates(&self) -> &TemplateCache {
        &self.templates
    }

    /// Read handle on the synthesis offset.
    pub fn offset(&self) -> &SharedOffset {
        &self.offset
    }

    /// The corpus schema this generator was built with.
    pub fn schema(&self) -> &CorpusSchema {
        &self.schema
    }

    /// Lifecycle state of a table as observed by this process.
    pub async fn state(&self, table: &str) -> TableState {
        self.tables
            .lock()
            .await
            .get(table)
            .map(|runtime| runtime.state)
            .unwrap_or(TableState::Uninitialized)
    }

    /// Idempotently seed the three counters for `table`.
    ///
    /// `next_insert_id` is seeded with `total_docs_hint + 1 +
    /// insert_start_offset`, reserving the template-id range for originals
    /// before synthetic ids begin. Safe to call redundantly from any number
    /// of workers and across restarts: losing the add-if-absent race is the
    /// expected case for all but one caller, and every caller re-checks the
    /// counters afterwards. Existing counters are never overwritten.
    pub async fn initialize_table(
        &self,
        table: &str,
        total_docs_hint: i64,
        insert_start_offset: i64,
    ) -> Result<(), GeneratorError> {
        if self.schema.get_table(table).is_none() {
            return Err(GeneratorError::TableNotFound(table.to_string()));
        }

        {
            let mut tables = self.tables.lock().await;
            if let Some(runtime) = tables.get(table) {
                if runtime.state == TableState::Ready {
                    return Ok(());
                }
            }
            tables.insert(
                table.to_string(),
                TableRuntime {
                    state: TableState::Initializing,
                    total_docs: 0,
                },
            );
        }

        let result = self
            .seed_and_confirm(table, total_docs_hint, insert_start_offset)
            .await;
        if result.is_err() {
            self.tables.lock().await.insert(
                table.to_string(),
                TableRuntime {
                    state: TableState::Uninitialized,
                    total_docs: 0,
                },
            );
        }
        result
    }

    async fn seed_and_confirm(
        &self,
        table: &str,
        total_docs_hint: i64,
        insert_start_offset: i64,
    ) -> Result<(), GeneratorError> {
        let seeds = [
            (CounterKind::TotalDocs, total_docs_hint),
            (
                CounterKind::NextInsertId,
                total_docs_hint + 1 + insert_start_offset,
            ),
            (CounterKind::StorageDocs, 0),
        ];
        for (kind, seed) in seeds {
            let key = counter_key(table, kind);
            if self
                .store
                .add_if_absent(&key, StoreValue::Counter(seed))
                .await?
            {
                debug!("Seeded counter {key} = {seed}");
            }
        }

        // Re-check all three regardless of which races this worker won.
        let mut total_docs = 0;
        for kind in CounterKind::ALL {
            let key = counter_key(table, kind);
            match self.store.get(&key).await? {
                Some(StoreValue::Counter(value)) => {
                    if kind == CounterKind::TotalDocs {
                        total_docs = value;
                    }
                }
                Some(StoreValue::Body(_)) => {
                    return Err(StoreError::NotACounter { key }.into());
                }
                None => {
                    return Err(GeneratorError::InitIncomplete {
                        table: table.to_string(),
                        key,
                    });
                }
            }
        }

        self.tables.lock().await.insert(
            table.to_string(),
            TableRuntime {
                state: TableState::Ready,
                total_docs,
            },
        );
        info!("Table '{table}' ready: {total_docs} template documents");
        Ok(())
    }

    /// Initialize every table in the schema, using each table's declared
    /// `total_docs` (or 0 when undeclared) as the seeding hint.
    ///
    /// Tables already initialized in the store keep their counters; the
    /// hint only matters for the first worker to ever reach the store.
    pub async fn initialize_all(&self, insert_start_offset: i64) -> Result<(), GeneratorError> {
        for table in &self.schema.tables {
            let hint = table.total_docs.unwrap_or(0);
            self.initialize_table(&table.name, hint, insert_start_offset)
                .await?;
        }
        Ok(())
    }

    /// Reserve the next storage identifier for `table`.
    ///
    /// The counter stores the next id to hand out, so the reserved id is
    /// the pre-increment value; uniqueness holds across any number of
    /// concurrent callers as long as the backing increment is atomic.
    /// Callers must never compute "current + 1" themselves.
    pub async fn allocate_id(&self, table: &str) -> Result<i64, GeneratorError> {
        let key = counter_key(table, CounterKind::NextInsertId);
        let next = self.store.increment(&key, 1).await?;
        Ok(next - 1)
    }

    /// Synthesize one document from the template with id `template_id`.
    ///
    /// `Ok(None)` means the template was never stored: a gap in template
    /// coverage, expected for optional tables. Callers skip the gap rather
    /// than aborting the run.
    pub async fn synthesize(
        &self,
        table: &str,
        template_id: i64,
    ) -> Result<Option<SynthesizedDocument>, GeneratorError> {
        let Some(template) = self.templates.get_template(table, template_id).await? else {
            debug!("No template {template_id} for table '{table}', skipping");
            return Ok(None);
        };
        self.synthesize_from(table, &template).await.map(Some)
    }

    /// Synthesize from an already-fetched template (bulk path).
    ///
    /// The derived id places the copy in the virtual replica addressed by
    /// the current offset; the storage id comes from the shared insert
    /// counter. The document is returned, not persisted.
    pub async fn synthesize_from(
        &self,
        table: &str,
        template: &TemplateDocument,
    ) -> Result<SynthesizedDocument, GeneratorError> {
        let spec = self
            .schema
            .get_table(table)
            .ok_or_else(|| GeneratorError::TableNotFound(table.to_string()))?;
        let total_docs = self.total_docs(table).await?;

        let offset = self.offset.current().await;
        let derived_id = offset.derived_id(template.id, total_docs);
        let storage_id = self.allocate_id(table).await?;

        Ok(SynthesizedDocument::from_template(
            spec, template, storage_id, derived_id,
        ))
    }

    /// Record one confirmed persistence for progress accounting. Returns
    /// the new stored count.
    pub async fn record_stored(&self, table: &str) -> Result<i64, GeneratorError> {
        let key = counter_key(table, CounterKind::StorageDocs);
        Ok(self.store.increment(&key, 1).await?)
    }

    /// Read-only progress snapshot from the shared counters.
    pub async fn progress(&self, table: &str) -> Result<TableProgress, GeneratorError> {
        let keys = vec![
            counter_key(table, CounterKind::StorageDocs),
            counter_key(table, CounterKind::TotalDocs),
        ];
        let values = self.store.get_bulk(&keys).await?;
        let read = |key: &String| {
            values
                .get(key)
                .and_then(StoreValue::as_counter)
                .unwrap_or(0)
        };
        Ok(TableProgress {
            stored: read(&keys[0]),
            total: read(&keys[1]),
        })
    }

    async fn total_docs(&self, table: &str) -> Result<i64, GeneratorError> {
        let tables = self.tables.lock().await;
        match tables.get(table) {
            Some(runtime) if runtime.state == TableState::Ready => Ok(runtime.total_docs),
            _ => Err(GeneratorError::TableNotReady(table.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use counter_store::MemoryStore;
    use serde_json::json;

    const SCHEMA_YAML: &str = r#"
version: 1
max_col: 9

tables:
  - name: incidents
    id_field: _id
    origin_field: source_incident
  - name: schools
"#;

    fn generator() -> (DocumentGenerator, PassAdvancer) {
        let schema = CorpusSchema::from_yaml(SCHEMA_YAML).unwrap();
        DocumentGenerator::new(Arc::new(MemoryStore::new()), schema)
    }

    #[tokio::test]
    async fn test_first_allocated_id_reserves_original_range() {
        let (generator, _advancer) = generator();
        generator
            .initialize_table("incidents", 10, 5)
            .await
            .unwrap();

        // 10 originals + 5 reserved: the first synthetic id is 16.
        assert_eq!(generator.allocate_id("incidents").await.unwrap(), 16);
        assert_eq!(generator.allocate_id("incidents").await.unwrap(), 17);
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let (generator, _advancer) = generator();
        generator
            .initialize_table("incidents", 10, 5)
            .await
            .unwrap();
        // A second caller with a different hint must not disturb anything.
        generator
            .initialize_table("incidents", 999, 0)
            .await
            .unwrap();

        assert_eq!(generator.state("incidents").await, TableState::Ready);
        assert_eq!(generator.allocate_id("incidents").await.unwrap(), 16);
    }

    #[tokio::test]
    async fn test_unknown_table_is_rejected() {
        let (generator, _advancer) = generator();
        let result = generator.initialize_table("nonexistent", 10, 0).await;
        assert!(matches!(result, Err(GeneratorError::TableNotFound(_))));
    }

    #[tokio::test]
    async fn test_allocate_before_initialize_surfaces_not_found() {
        let (generator, _advancer) = generator();
        let result = generator.allocate_id("incidents").await;
        assert!(matches!(
            result,
            Err(GeneratorError::Store(StoreError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_synthesize_derives_replica_id() {
        let (generator, advancer) = generator();
        generator
            .initialize_table("incidents", 50, 0)
            .await
            .unwrap();
        generator
            .templates()
            .put_template("incidents", 100, &json!({ "_id": 100, "type": "fire" }))
            .await
            .unwrap();

        // Move the offset to (1, 3): ordinal 1*9 + 3 = 12.
        for _ in 0..13 {
            advancer.advance_pass().await;
        }

        let document = generator
            .synthesize("incidents", 100)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(document.derived_id, 700);
        assert_eq!(document.origin_id, 100);
        // First synthetic id after 50 originals.
        assert_eq!(document.storage_id, 51);
        assert_eq!(document.body["_id"], json!(51));
        assert_eq!(document.body["source_incident"], json!(100));
        assert_eq!(document.body["type"], json!("fire"));
    }

    #[tokio::test]
    async fn test_missing_template_is_soft() {
        let (generator, _advancer) = generator();
        generator
            .initialize_table("incidents", 50, 0)
            .await
            .unwrap();

        assert!(generator.synthesize("incidents", 999).await.unwrap().is_none());

        // Other tables keep working after the gap.
        generator.initialize_table("schools", 5, 0).await.unwrap();
        generator
            .templates()
            .put_template("schools", 1, &json!({ "id": 1 }))
            .await
            .unwrap();
        assert!(generator.synthesize("schools", 1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_synthesize_before_initialize_is_rejected() {
        let (generator, _advancer) = generator();
        generator
            .templates()
            .put_template("incidents", 1, &json!({ "_id": 1 }))
            .await
            .unwrap();

        let result = generator.synthesize("incidents", 1).await;
        assert!(matches!(result, Err(GeneratorError::TableNotReady(_))));
    }

    #[tokio::test]
    async fn test_record_stored_feeds_progress() {
        let (generator, _advancer) = generator();
        generator
            .initialize_table("incidents", 10, 0)
            .await
            .unwrap();

        assert_eq!(generator.record_stored("incidents").await.unwrap(), 1);
        assert_eq!(generator.record_stored("incidents").await.unwrap(), 2);

        let progress = generator.progress("incidents").await.unwrap();
        assert_eq!(progress.stored, 2);
        assert_eq!(progress.total, 10);
        assert!((progress.ratio() - 0.2).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_initialize_all_uses_declared_totals() {
        let yaml = r#"
version: 1
tables:
  - name: incidents
    total_docs: 25
  - name: schools
"#;
        let schema = CorpusSchema::from_yaml(yaml).unwrap();
        let (generator, _advancer) =
            DocumentGenerator::new(Arc::new(MemoryStore::new()), schema);

        generator.initialize_all(0).await.unwrap();

        assert_eq!(generator.allocate_id("incidents").await.unwrap(), 26);
        assert_eq!(generator.state("schools").await, TableState::Ready);
    }
}
