//! Counter-coordinated document generator for the corpus-scale engine.
//!
//! This crate provides the [`DocumentGenerator`], which turns a small set
//! of captured template documents into an arbitrarily large synthesized
//! dataset, coordinated across workers through the shared counter store.
//!
//! # Architecture
//!
//! ```text
//!            CorpusSchema (YAML)
//!                   │
//!                   ▼
//!        ┌────────────────────┐
//!        │  DocumentGenerator │──── TemplateCache ──┐
//!        │                    │                     ▼
//!        │  - table registry  │               CounterStore
//!        │  - SharedOffset    │◄── PassAdvancer     │
//!        └─────────┬──────────┘   (orchestrator)    │
//!                  │                                │
//!                  ▼                                │
//!        SynthesizedDocument { storage_id, derived_id, origin_id, body }
//! ```
//!
//! The generator never persists documents itself; the database-binding
//! layer obtains ids and documents here and talks to its database on its
//! own. All cross-worker coordination flows through the store's atomic
//! add-if-absent and increment.
//!
//! # Example
//!
//! ```rust,no_run
//! use counter_store::MemoryStore;
//! use std::sync::Arc;
//! use synth_core::CorpusSchema;
//! use synth_generator::DocumentGenerator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = CorpusSchema::from_yaml(
//!     "version: 1\nmax_col: 9\ntables:\n  - name: incidents\n",
//! )?;
//! let store = Arc::new(MemoryStore::new());
//! let (generator, advancer) = DocumentGenerator::new(store, schema);
//!
//! generator.initialize_table("incidents", 50, 0).await?;
//! if let Some(document) = generator.synthesize("incidents", 7).await? {
//!     println!("synthesized storage id {}", document.storage_id);
//! }
//! advancer.advance_pass().await;
//! # Ok(())
//! # }
//! ```

pub mod generator;
pub mod offset;
pub mod templates;

// Re-exports for convenience
pub use generator::{DocumentGenerator, GeneratorError, TableProgress, TableState};
pub use offset::{offset_handles, PassAdvancer, SharedOffset};
pub use templates::{TemplateCache, TemplateError};
