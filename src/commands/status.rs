//! Status command: per-table progress from the shared counters.

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Args;
use counter_store::CounterStore;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use synth_core::CorpusSchema;
use synth_generator::DocumentGenerator;
use tracing::info;

/// Arguments for the status command.
#[derive(Args, Clone, Debug)]
pub struct StatusArgs {
    /// Path to the corpus schema YAML file
    #[arg(long, short = 's')]
    pub schema: PathBuf,
}

#[derive(Debug, Serialize)]
struct TableStatus {
    table: String,
    stored: i64,
    total: i64,
    ratio: f64,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    generated_at: DateTime<Utc>,
    tables: Vec<TableStatus>,
}

/// Run the status command.
pub async fn run_status(args: StatusArgs, store: Arc<dyn CounterStore>) -> anyhow::Result<()> {
    let schema = CorpusSchema::from_file(&args.schema)
        .with_context(|| format!("Failed to load corpus schema from {:?}", args.schema))?;

    let (generator, _advancer) = DocumentGenerator::new(store, schema.clone());

    let mut tables = Vec::new();
    for table in &schema.tables {
        let progress = generator
            .progress(&table.name)
            .await
            .with_context(|| format!("Failed to read counters for table {}", table.name))?;

        info!(
            "Table {}: {}/{} stored ({:.1}%)",
            table.name,
            progress.stored,
            progress.total,
            progress.ratio() * 100.0
        );
        tables.push(TableStatus {
            table: table.name.clone(),
            stored: progress.stored,
            total: progress.total,
            ratio: progress.ratio(),
        });
    }

    let report = StatusReport {
        generated_at: Utc::now(),
        tables,
    };

    // One JSON line for CI tooling, easy to parse
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}
