//! malice CLI - perturb images before they are published.
//!
//! malice layers noise, a watermark, a branding logo and rewritten EXIF
//! metadata onto an image so it is less useful as AI training data while
//! still looking fine to people.
//!
//! # Usage
//!
//! ```bash
//! # Process a single image
//! malice process photo.jpg
//!
//! # Process a directory with a fixed seed and a JSONL run report
//! malice process ./photos/ --seed 42 --report runs.jsonl --report-format jsonl
//!
//! # Look at the metadata of a processed file
//! malice inspect maliced-photo.png
//!
//! # View configuration
//! malice config show
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use malice_core::Config;

mod cli;
mod logging;

/// malice - noise, watermark and no-AI metadata for images.
#[derive(Parser, Debug)]
#[command(name = "malice")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "MALICE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Perturb an image or every image in a directory
    Process(cli::process::ProcessArgs),

    /// Print format, EXIF, GPS and no-AI markers of an image as JSON
    Inspect(cli::inspect::InspectArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("ERROR: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => match Config::load() {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "Warning: Failed to load config: {e}\n  \
                     Using default configuration. Check your config file with `malice config path`."
                );
                Config::default()
            }
        },
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("malice v{}", malice_core::VERSION);

    match cli.command {
        Commands::Process(args) => cli::process::execute(args, config),
        Commands::Inspect(args) => cli::inspect::execute(args),
        Commands::Config(args) => cli::config::execute(args, &config, cli.config.as_deref()),
    }
}
