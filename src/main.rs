//! gscholar-metrics - Google Scholar citation metrics per researcher
//!
//! ## Usage
//!
//! ```bash
//! gscholar-metrics --input-file dosen.xlsx --output-file citations.csv --num-of-samples 5
//! ```

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use gscholar_metrics::browser::{BrowserOptions, ChromeLauncher};
use gscholar_metrics::export::{save_joined, SaveOutcome};
use gscholar_metrics::options::DEFAULT_SCHOLAR_URL;
use gscholar_metrics::{pipeline, roster, ScrapeOptions};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Scrape Google Scholar citation data for a roster of researchers
#[derive(Parser)]
#[command(name = "gscholar-metrics")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Input file containing the scholar ids (xlsx, xls, ods or csv)
    #[arg(long)]
    input_file: PathBuf,

    /// Output file to save the citation data, should be a CSV file
    #[arg(long)]
    output_file: PathBuf,

    /// Use a random sample of the roster instead of every row
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    using_samples: bool,

    /// Number of researchers to sample
    #[arg(long, default_value_t = 3)]
    num_of_samples: usize,

    /// Google Scholar base URL or mirror
    #[arg(long, default_value = DEFAULT_SCHOLAR_URL)]
    base_url: String,

    /// Settle delay after each page load, in milliseconds
    #[arg(long, default_value_t = 1000)]
    load_delay_ms: u64,

    /// Settle delay after each "show more" click, in milliseconds
    #[arg(long, default_value_t = 2000)]
    more_delay_ms: u64,

    /// Maximum "show more" clicks per profile
    #[arg(long, default_value_t = 50)]
    max_expansions: usize,

    /// Chrome/Chromium executable (auto-detected by default)
    #[arg(long)]
    chrome: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .init();

    let all = roster::load_roster(&cli.input_file).context("Failed to load roster")?;

    let researchers = if cli.using_samples {
        let picked = roster::sample_researchers(&all, cli.num_of_samples, &mut rand::thread_rng())?;
        println!("Using number of samples: {}", cli.num_of_samples);
        for researcher in &picked {
            println!(
                "Using Dosen Name: {} with Scholar ID: {}",
                researcher.display_name, researcher.scholar_id
            );
        }
        picked
    } else {
        println!("Using all data in {}", cli.input_file.display());
        all
    };

    let options = ScrapeOptions {
        base_url: cli.base_url,
        load_delay: Duration::from_millis(cli.load_delay_ms),
        more_delay: Duration::from_millis(cli.more_delay_ms),
        max_expansions: cli.max_expansions,
        show_progress: true,
    };
    let launcher = ChromeLauncher::new(BrowserOptions {
        chrome_executable: cli.chrome,
    });

    let output = pipeline::run(&launcher, &researchers, &options)
        .await
        .context("Pipeline failed")?;
    info!(stats = ?output.stats, "Run statistics");

    match save_joined(&cli.output_file, &output.rows)? {
        SaveOutcome::Written { path, rows: 0 } => {
            println!("No citation data collected; wrote header only to {}", path.display());
        }
        SaveOutcome::Written { path, rows } => {
            println!("Saved {} rows to {}", rows, path.display());
        }
        SaveOutcome::Previewed { preview, total } => {
            println!("Warning: Output file must be a CSV file.");
            println!("Printing the first rows of {} joined rows:", total);
            println!("{}", preview);
        }
    }

    Ok(())
}
