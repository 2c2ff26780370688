//! Spigot CLI - Extract structured record streams from an embedded database file

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use spigot_connectors::{EmbeddedConnector, SourceConnector};
use spigot_core::{SourceConfig, WriterSink};
use spigot_runner::Coordinator;
use spigot_state::{load_catalog, save_catalog, RunStore, StateDocument, StreamStatus};

#[derive(Parser)]
#[command(name = "spigot")]
#[command(about = "Extract structured record streams from an embedded database file")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover the catalog of available streams
    Discover {
        /// Path to the source config JSON file
        #[arg(short, long)]
        config: PathBuf,

        /// Output path for the catalog document
        #[arg(short, long, default_value = "catalog.json")]
        out: PathBuf,
    },

    /// Extract the selected streams, emitting tap messages on stdout
    Extract {
        /// Path to the source config JSON file
        #[arg(short, long)]
        config: PathBuf,

        /// Previously discovered catalog (discovered fresh when omitted)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// State document from an earlier run, for incremental extraction
        #[arg(long)]
        state: Option<PathBuf>,

        /// Directory for run summaries and checkpointed state
        #[arg(long, default_value = "./spigot-runs")]
        run_dir: PathBuf,
    },

    /// Show a summary report for an extraction run
    Report {
        /// Path to the run directory root (or a specific run)
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Records go to stdout; all logging goes to stderr.
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Discover { config, out } => discover(&config, &out).await,
        Commands::Extract {
            config,
            catalog,
            state,
            run_dir,
        } => extract(&config, catalog.as_deref(), state.as_deref(), &run_dir).await,
        Commands::Report { path } => show_report(&path),
    }
}

async fn discover(config_path: &Path, out: &Path) -> Result<()> {
    let config = SourceConfig::from_file(config_path)?;
    let connector = EmbeddedConnector::connect(config).await?;
    let catalog = connector.discover().await?;
    save_catalog(out, &catalog)?;
    println!("Discovered {} stream(s) -> {}", catalog.len(), out.display());
    Ok(())
}

async fn extract(
    config_path: &Path,
    catalog_path: Option<&Path>,
    state_path: Option<&Path>,
    run_dir: &Path,
) -> Result<()> {
    let config = SourceConfig::from_file(config_path)?;
    let connector = Arc::new(EmbeddedConnector::connect(config).await?);

    let catalog = match catalog_path {
        Some(path) => {
            let catalog = load_catalog(path)?;
            info!("Loaded catalog with {} stream(s) from {}", catalog.len(), path.display());
            catalog
        }
        None => connector.discover().await?,
    };

    let prior = match state_path {
        Some(path) => RunStore::load_state(path)?,
        None => StateDocument::default(),
    };

    let store = RunStore::new(run_dir)?;
    let coordinator = Coordinator::new(connector, store);

    // Cancel cleanly on Ctrl-C; open connections close before the run
    // returns.
    let cancel = coordinator.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let mut sink = WriterSink::new(std::io::stdout().lock());
    let summary = coordinator.run(&catalog, &prior, &mut sink).await?;

    for stream in &summary.streams {
        info!(
            "{}: {:?} ({} records)",
            stream.stream_id, stream.status, stream.records_extracted
        );
    }

    if summary.has_failures() {
        let failed = summary
            .streams
            .iter()
            .filter(|s| s.status == StreamStatus::Failed)
            .count();
        anyhow::bail!("{} stream(s) failed", failed);
    }
    Ok(())
}

fn show_report(path: &Path) -> Result<()> {
    let run_path = if path.join("summary.json").exists() {
        path.to_path_buf()
    } else if path.join("runs").exists() {
        let store = RunStore::new(path)?;
        store
            .latest_run()?
            .ok_or_else(|| anyhow::anyhow!("No runs found in {}", path.display()))?
    } else {
        anyhow::bail!("Invalid run directory: {}", path.display());
    };

    let summary = RunStore::load_summary(&run_path)?;

    println!("\n=== Extraction Report ===");
    println!("Run ID: {}", summary.run_id);
    println!("Status: {:?}", summary.status);
    println!("Started: {}", summary.started_at);
    if let Some(completed) = summary.completed_at {
        println!("Completed: {}", completed);
    }
    println!();
    println!("Streams:");
    for stream in &summary.streams {
        println!(
            "  {:<40} {:?} ({} records)",
            stream.stream_id, stream.status, stream.records_extracted
        );
        if let Some(error) = &stream.error {
            println!("    cause: {}", error);
        }
    }

    let total: u64 = summary.streams.iter().map(|s| s.records_extracted).sum();
    println!("\nTotal records: {}", total);

    Ok(())
}
