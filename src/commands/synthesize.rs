//! Synthesize command: generate virtual replicas of the corpus to JSONL.
//!
//! Each pass writes one JSONL file per table (the stand-in for the external
//! document database) and records stored counts in the shared store. Only
//! the worker started with `--coordinator` advances the pass offset; every
//! other worker leaves its `PassAdvancer` unused.

use anyhow::Context;
use clap::Args;
use counter_store::CounterStore;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use synth_generator::DocumentGenerator;
use synth_core::CorpusSchema;
use tracing::{debug, info};

/// Arguments for the synthesize command.
#[derive(Args, Clone, Debug)]
pub struct SynthesizeArgs {
    /// Path to the corpus schema YAML file
    #[arg(long, short = 's')]
    pub schema: PathBuf,

    /// Number of synthesis passes to run
    #[arg(long, default_value = "1")]
    pub passes: u32,

    /// Specific tables to synthesize (comma-separated, empty = all tables)
    #[arg(long, value_delimiter = ',')]
    pub tables: Vec<String>,

    /// Directory for synthesized JSONL output (one file per table per pass)
    #[arg(long, default_value = "synthesized")]
    pub out_dir: PathBuf,

    /// Batch size for bulk template fetches
    #[arg(long, default_value = "100")]
    pub batch_size: usize,

    /// Advance the shared offset after each pass. Exactly one worker per
    /// pass may run with this flag.
    #[arg(long)]
    pub coordinator: bool,
}

/// Metrics from one table's synthesis within a pass.
#[derive(Debug, Clone, Default)]
pub struct PassMetrics {
    /// Documents synthesized and written.
    pub documents_synthesized: u64,
    /// Template ids in range with no stored body.
    pub templates_missing: u64,
    /// Total time taken.
    pub total_duration: Duration,
}

impl PassMetrics {
    /// Calculate documents per second.
    pub fn docs_per_second(&self) -> f64 {
        if self.total_duration.as_secs_f64() > 0.0 {
            self.documents_synthesized as f64 / self.total_duration.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// Run the synthesize command.
pub async fn run_synthesize(
    args: SynthesizeArgs,
    store: Arc<dyn CounterStore>,
) -> anyhow::Result<()> {
    let schema = CorpusSchema::from_file(&args.schema)
        .with_context(|| format!("Failed to load corpus schema from {:?}", args.schema))?;

    let tables: Vec<String> = if args.tables.is_empty() {
        schema.table_names()
    } else {
        args.tables.clone()
    };

    let insert_start = schema.insert_start;
    let (generator, advancer) = DocumentGenerator::new(store, schema);

    // Redundant initialization is safe; a restarted worker just observes
    // the counters the preload (or another worker) already seeded.
    generator
        .initialize_all(insert_start)
        .await
        .context("Failed to initialize table counters")?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create output directory {:?}", args.out_dir))?;

    for pass in 0..args.passes {
        let offset = generator.offset().current().await;
        info!(
            "Pass {}/{} at offset ({}, {})",
            pass + 1,
            args.passes,
            offset.row(),
            offset.col()
        );

        for table in &tables {
            let metrics = synthesize_table(&generator, table, &args)
                .await
                .with_context(|| format!("Failed to synthesize table {table}"))?;
            info!(
                "Table {} synthesized: {} documents in {:?} ({:.2} docs/sec, {} gaps)",
                table,
                metrics.documents_synthesized,
                metrics.total_duration,
                metrics.docs_per_second(),
                metrics.templates_missing
            );
        }

        if args.coordinator {
            advancer.advance_pass().await;
        }
    }

    Ok(())
}

/// Synthesize one full replica of `table` to a JSONL file.
async fn synthesize_table(
    generator: &DocumentGenerator,
    table: &str,
    args: &SynthesizeArgs,
) -> anyhow::Result<PassMetrics> {
    let start = Instant::now();
    let mut metrics = PassMetrics::default();

    let total = generator.progress(table).await?.total;
    let offset = generator.offset().current().await;

    let path = args
        .out_dir
        .join(format!("{table}_r{}_c{}.jsonl", offset.row(), offset.col()));
    let file = std::fs::File::create(&path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;
    let mut writer = std::io::BufWriter::new(file);

    let mut next_id = 1i64;
    while next_id <= total {
        let span = std::cmp::min(args.batch_size as i64, total - next_id + 1);
        let ids: Vec<i64> = (next_id..next_id + span).collect();
        next_id += span;

        let templates = generator.templates().get_bulk_templates(table, &ids).await?;
        for id in &ids {
            let Some(template) = templates.get(id) else {
                debug!("No template {id} for table '{table}', skipping");
                metrics.templates_missing += 1;
                continue;
            };
            let document = generator.synthesize_from(table, template).await?;
            serde_json::to_writer(&mut writer, &document)?;
            writer.write_all(b"\n")?;
            generator.record_stored(table).await?;
            metrics.documents_synthesized += 1;
        }
    }

    writer.flush()?;
    metrics.total_duration = start.elapsed();
    Ok(metrics)
}
