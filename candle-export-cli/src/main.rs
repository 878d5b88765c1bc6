//! Candle Export CLI — export and plan commands.
//!
//! Commands:
//! - `export` — fetch candles for every configured pair and write one CSV per pair
//! - `plan` — print the request windows each pair would be fetched in (no network)

use anyhow::{Context, Result};
use candle_export_core::data::CoinbaseProvider;
use candle_export_core::export::output_file_name;
use candle_export_core::{
    estimate_chunk_count, plan_chunks, run_export, ExportConfig, ExportOptions, RunSummary,
    TracingObserver,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "candle-export",
    about = "Candle Export — historical exchange candles to CSV"
)]
struct Cli {
    /// Log this tool's DEBUG events (overrides RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch candles for every configured pair and write one CSV per pair.
    Export {
        /// Path to the JSON (or .toml) config file.
        #[arg(long, default_value = "config.json")]
        config: PathBuf,

        /// Directory the CSV files are written into.
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Pause after every chunk, in milliseconds.
        #[arg(long, default_value_t = 500)]
        chunk_pause_ms: u64,
    },
    /// Print the request windows for every configured pair without fetching.
    Plan {
        /// Path to the JSON (or .toml) config file.
        #[arg(long, default_value = "config.json")]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Export {
            config,
            output_dir,
            chunk_pause_ms,
        } => run_export_cmd(&config, output_dir, chunk_pause_ms),
        Commands::Plan { config } => run_plan_cmd(&config),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("candle_export_core=debug,candle_export=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: &Path) -> Result<ExportConfig> {
    ExportConfig::from_file(path).with_context(|| format!("loading config {}", path.display()))
}

fn run_export_cmd(config_path: &Path, output_dir: PathBuf, chunk_pause_ms: u64) -> Result<()> {
    let config = load_config(config_path)?;
    let provider = CoinbaseProvider::new().context("creating Coinbase client")?;
    let options = ExportOptions {
        output_dir,
        chunk_pause: Duration::from_millis(chunk_pause_ms),
    };

    let summary = run_export(&provider, &config, &options, &TracingObserver)
        .context("writing candle export")?;

    print_summary(&summary);
    Ok(())
}

fn run_plan_cmd(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;

    println!("Range:   {} to {}", config.start, config.end);
    println!(
        "Retries: {} attempt(s), {} ms apart",
        config.max_retries,
        config.retry_delay.as_millis()
    );

    for instrument in &config.instruments {
        for granularity in &config.granularities {
            let chunks = plan_chunks(instrument, granularity, config.start, config.end);
            println!();
            println!(
                "{instrument} {granularity}: {} chunk(s) (estimated {}) -> {}",
                chunks.len(),
                estimate_chunk_count(granularity, config.start, config.end),
                output_file_name(instrument, granularity)
            );
            println!("{:>5}  {:<25} {:<25}", "#", "Window Start", "Window End");
            println!("{}", "-".repeat(57));
            for (i, chunk) in chunks.iter().enumerate() {
                println!(
                    "{:>5}  {:<25} {:<25}",
                    i + 1,
                    chunk.window_start.to_string(),
                    chunk.window_end.to_string()
                );
            }
        }
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("=== Export Result ===");
    println!(
        "{:<12} {:<16} {:>7} {:>8} {:>8}  {}",
        "Instrument", "Granularity", "Chunks", "Skipped", "Rows", "File"
    );
    println!("{}", "-".repeat(80));
    for pair in &summary.pairs {
        let file = pair
            .output
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(no data)".into());
        println!(
            "{:<12} {:<16} {:>7} {:>8} {:>8}  {}",
            pair.instrument,
            pair.granularity.to_string(),
            pair.chunks,
            pair.chunks_skipped,
            pair.rows,
            file
        );
    }
    println!();
    println!(
        "Files written: {}  Empty pairs: {}  Rows: {}",
        summary.files_written(),
        summary.empty_pairs(),
        summary.rows_written()
    );
    if summary.chunks_skipped() > 0 {
        println!(
            "WARNING: {} chunk(s) skipped after exhausting retries",
            summary.chunks_skipped()
        );
    }
    println!();
}
