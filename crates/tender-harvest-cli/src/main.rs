//! tender-harvest command-line entry point.

mod doctor;
mod settings;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use tender_harvest::{ChromiumOptions, ChromiumRenderer, CsvSnapshotWriter, Dataset};

#[derive(Parser)]
#[command(
    name = "tender-harvest",
    about = "Collect tender results for a list of land-sale sites from the URA map portal",
    version
)]
struct Cli {
    #[command(flatten)]
    run: RunArgs,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Also append logs to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options of a harvesting run.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Input spreadsheet (.xlsx, .xls, .ods) or CSV with a `Location` column.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Directory for the interim and final CSV snapshots.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// JSON config file; flags override its values.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Run Chromium without a window.
    #[arg(long)]
    pub headless: bool,

    /// Save a screenshot and HTML dump at every step.
    #[arg(long)]
    pub debug: bool,

    /// Directory for debug artifacts.
    #[arg(long)]
    pub debug_dir: Option<PathBuf>,

    /// First row index to process.
    #[arg(long)]
    pub start: Option<usize>,

    /// One past the last row index to process.
    #[arg(long)]
    pub end: Option<usize>,

    /// Attempts per location.
    #[arg(long)]
    pub retries: Option<u32>,

    /// Portal URL (also TENDER_HARVEST_BASE_URL).
    #[arg(long)]
    pub base_url: Option<String>,

    /// Select the search result whose award date matches the row's `Date of Award`.
    #[arg(long)]
    pub verify_award_date: bool,

    /// Only rows with several bids and no other tenderer recorded.
    #[arg(long)]
    pub pending_only: bool,

    /// Keep at most this many other tenderers per site.
    #[arg(long)]
    pub max_other_tenderers: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest tender results (default).
    Run(RunArgs),

    /// Check that Chromium and the output directory are usable.
    Doctor {
        /// Output directory to check.
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   tender-harvest completions bash > ~/.local/share/bash-completion/completions/tender-harvest
    ///   tender-harvest completions zsh > ~/.zfunc/_tender-harvest
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

fn init_logging(level: &str, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::io::stderr.and(Arc::new(file)))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

async fn harvest(args: RunArgs) -> anyhow::Result<()> {
    let input = args
        .input
        .clone()
        .context("--input is required (see --help)")?;
    let config = settings::resolve(&args)?;

    let dataset = Dataset::load(&input)
        .with_context(|| format!("failed to read input {}", input.display()))?;

    let options = ChromiumOptions {
        headless: config.headless,
        ..Default::default()
    };
    let mut renderer = ChromiumRenderer::launch(&options)
        .await
        .context("failed to launch Chromium (run `tender-harvest doctor`)")?;
    let mut sink = CsvSnapshotWriter::new(config.output_dir.clone());

    let report = tender_harvest::run(&mut renderer, dataset, &mut sink, &config)
        .await
        .context("harvest aborted")?;

    println!("Processed:     {}", report.processed);
    println!("  Success:     {}", report.succeeded);
    println!("  No results:  {}", report.no_results);
    println!("  Failed:      {}", report.failed);
    if let Some(path) = &report.final_snapshot {
        println!("Results:       {}", path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_file.as_deref())?;

    match cli.command {
        None => harvest(cli.run).await?,
        Some(Commands::Run(args)) => harvest(args).await?,
        Some(Commands::Doctor { output_dir }) => doctor::run(&output_dir).await?,
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "tender-harvest", &mut std::io::stdout());
        }
    }

    Ok(())
}
