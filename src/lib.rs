//! corpus-scale library
//!
//! Scales a small corpus of captured real documents into an arbitrarily
//! large, still-realistic dataset, coordinated across benchmark workers
//! through a shared counter store.
//!
//! # Components
//!
//! - `counter-store` - atomic add-if-absent/increment over a shared store
//! - `synth-core` - counter keys, the synthesis offset, schema, documents
//! - `synth-generator` - template cache and the orchestrating generator
//! - this crate - the CLI gluing them together
//!
//! # CLI Usage
//!
//! ```bash
//! # Store captured documents as templates and seed the counters
//! corpus-scale preload --schema corpus.yaml --templates-dir captures \
//!   --store-uri mongodb://localhost:27017
//!
//! # Synthesize two virtual replicas of every table, advancing the pass
//! # offset (exactly one worker per pass runs with --coordinator)
//! corpus-scale synthesize --schema corpus.yaml --passes 2 --coordinator \
//!   --store-uri mongodb://localhost:27017
//!
//! # Report per-table progress
//! corpus-scale status --schema corpus.yaml \
//!   --store-uri mongodb://localhost:27017
//! ```

use anyhow::Context;
use clap::Args;
use counter_store::{CounterStore, MemoryStore, MongoCounterStore};
use std::sync::Arc;

pub mod commands;

/// Shared-store connection options common to all subcommands.
#[derive(Args, Clone, Debug)]
pub struct StoreOpts {
    /// Counter store URI ("mongodb://..." or "memory" for a process-local store)
    #[arg(long, env = "CORPUS_SCALE_STORE_URI", default_value = "memory")]
    pub store_uri: String,

    /// Database holding the counter collection (MongoDB backend only)
    #[arg(long, default_value = "corpus_scale")]
    pub store_database: String,

    /// Collection holding counters and templates (MongoDB backend only)
    #[arg(long, default_value = "counters")]
    pub store_collection: String,
}

/// Connect to the configured counter store.
///
/// A worker that cannot reach the store at startup cannot do useful work,
/// so connection failures abort immediately instead of retrying.
pub async fn connect_store(opts: &StoreOpts) -> anyhow::Result<Arc<dyn CounterStore>> {
    if opts.store_uri == "memory" {
        tracing::warn!("Using a process-local store; counters are not shared across workers");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let store = MongoCounterStore::connect(
        &opts.store_uri,
        &opts.store_database,
        &opts.store_collection,
    )
    .await
    .with_context(|| format!("Failed to connect to counter store at {}", opts.store_uri))?;
    Ok(Arc::new(store))
}
