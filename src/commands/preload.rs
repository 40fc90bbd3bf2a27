//! Preload command: capture template documents into the shared store.

use anyhow::Context;
use clap::Args;
use counter_store::CounterStore;
use std::path::PathBuf;
use std::sync::Arc;
use synth_core::CorpusSchema;
use synth_generator::DocumentGenerator;
use tracing::{info, warn};

/// Arguments for the preload command.
#[derive(Args, Clone, Debug)]
pub struct PreloadArgs {
    /// Path to the corpus schema YAML file
    #[arg(long, short = 's')]
    pub schema: PathBuf,

    /// Directory containing one `<table>.jsonl` capture file per table
    #[arg(long)]
    pub templates_dir: PathBuf,

    /// Identifier range reserved between originals and synthesized
    /// documents (overrides the schema's insert_start)
    #[arg(long)]
    pub insert_start: Option<i64>,
}

/// Run the preload command.
///
/// Stores every captured document as a template (ids assigned by line
/// position, 1-based) and then idempotently seeds the table's counters
/// with the observed document count as the hint. Re-running against an
/// already-seeded store rewrites template bodies but never touches the
/// counters.
pub async fn run_preload(args: PreloadArgs, store: Arc<dyn CounterStore>) -> anyhow::Result<()> {
    let schema = CorpusSchema::from_file(&args.schema)
        .with_context(|| format!("Failed to load corpus schema from {:?}", args.schema))?;
    let insert_start = args.insert_start.unwrap_or(schema.insert_start);

    info!("Preloading templates from {:?}", args.templates_dir);
    let (generator, _advancer) = DocumentGenerator::new(store, schema.clone());

    let mut total_templates = 0i64;
    for table in &schema.tables {
        let path = args.templates_dir.join(format!("{}.jsonl", table.name));
        if !path.exists() {
            warn!(
                "No capture file for table '{}' at {}, skipping",
                table.name,
                path.display()
            );
            continue;
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read capture file {}", path.display()))?;

        let mut count = 0i64;
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let body: serde_json::Value = serde_json::from_str(line).with_context(|| {
                format!("Malformed JSON at {}:{}", path.display(), line_no + 1)
            })?;
            count += 1;
            generator
                .templates()
                .put_template(&table.name, count, &body)
                .await
                .with_context(|| format!("Failed to store template for table {}", table.name))?;
        }

        generator
            .initialize_table(&table.name, count, insert_start)
            .await
            .with_context(|| format!("Failed to initialize counters for table {}", table.name))?;

        info!(
            "Table '{}': {} templates stored, counters initialized",
            table.name, count
        );
        total_templates += count;
    }

    info!(
        "Preload complete: {} templates across {} tables",
        total_templates,
        schema.tables.len()
    );
    Ok(())
}
