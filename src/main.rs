//! Command-line interface for corpus-scale
//!
//! # Usage Examples
//!
//! ## Preload
//! ```bash
//! # Store captured documents as templates and seed per-table counters
//! corpus-scale preload \
//!   --schema corpus.yaml \
//!   --templates-dir captures \
//!   --store-uri mongodb://localhost:27017
//! ```
//!
//! ## Synthesize
//! ```bash
//! # One worker per machine; exactly one of them coordinates the pass
//! corpus-scale synthesize \
//!   --schema corpus.yaml \
//!   --passes 4 \
//!   --out-dir synthesized \
//!   --coordinator \
//!   --store-uri mongodb://localhost:27017
//! ```
//!
//! ## Status
//! ```bash
//! corpus-scale status \
//!   --schema corpus.yaml \
//!   --store-uri mongodb://localhost:27017
//! ```

use clap::{Parser, Subcommand};
use corpus_scale::commands::{preload, status, synthesize};
use corpus_scale::{connect_store, StoreOpts};

#[derive(Parser)]
#[command(name = "corpus-scale")]
#[command(about = "Scales a captured document corpus into distributed load-test datasets")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store captured template documents and seed per-table counters
    Preload {
        #[command(flatten)]
        args: preload::PreloadArgs,

        /// Shared counter store options
        #[command(flatten)]
        store: StoreOpts,
    },

    /// Synthesize virtual replicas of the corpus to JSONL files
    Synthesize {
        #[command(flatten)]
        args: synthesize::SynthesizeArgs,

        /// Shared counter store options
        #[command(flatten)]
        store: StoreOpts,
    },

    /// Report per-table synthesis progress
    Status {
        #[command(flatten)]
        args: status::StatusArgs,

        /// Shared counter store options
        #[command(flatten)]
        store: StoreOpts,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Preload { args, store } => {
            let store = connect_store(&store).await?;
            preload::run_preload(args, store).await
        }
        Commands::Synthesize { args, store } => {
            let store = connect_store(&store).await?;
            synthesize::run_synthesize(args, store).await
        }
        Commands::Status { args, store } => {
            let store = connect_store(&store).await?;
            status::run_status(args, store).await
        }
    }
}
