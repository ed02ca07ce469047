//! ChainFeed CLI — decode a node's instrumentation output into blocks.
//!
//! # Commands
//! ```text
//! chainfeed decode   [--input <path|->] [--config <file.yaml>] [--envelope] [--json]
//! chainfeed inspect  --line "DMLOG BLOCK <height> <hex>"
//! ```

use anyhow::{Context, Result};
use chainfeed_observability::LogConfig;
use chainfeed_reader::ReaderConfig;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};

mod cmd_decode;
mod cmd_inspect;

#[derive(Parser)]
#[command(
    name = "chainfeed",
    about = "Decode blockchain node instrumentation into blocks — ChainFeed CLI",
    long_about = "
ChainFeed CLI: read the DMLOG lines an instrumented node prints while it
executes, and turn them into decoded blocks or block envelopes.

ENVIRONMENT VARIABLES:
  RUST_LOG    overrides the configured log filter
",
    version
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// YAML file with `reader` and `log` sections
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode every block found in a captured or piped console stream
    Decode {
        /// Input file, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: String,
        /// Print full block envelopes instead of summaries
        #[arg(long)]
        envelope: bool,
        /// Output as JSON lines
        #[arg(long)]
        json: bool,
        /// Stop after this many blocks
        #[arg(long)]
        max_blocks: Option<u64>,
        /// Report malformed lines and keep reading instead of aborting
        #[arg(long)]
        keep_going: bool,
    },

    /// Decode a single protocol line
    Inspect {
        /// The raw line, including its tag
        #[arg(long)]
        line: String,
    },
}

/// On-disk configuration.
#[derive(Debug, Default, Deserialize)]
struct AppConfig {
    #[serde(default)]
    reader: ReaderConfig,
    #[serde(default)]
    log: LogConfig,
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    if cli.verbose {
        config.log.level = "debug".into();
    }
    if let Ok(filter) = std::env::var("RUST_LOG") {
        config.log.level = filter;
    }
    chainfeed_observability::init_tracing(&config.log);

    match cli.command {
        Commands::Decode {
            input,
            envelope,
            json,
            max_blocks,
            keep_going,
        } => {
            let opts = cmd_decode::DecodeOptions {
                envelope,
                json,
                max_blocks,
                keep_going,
            };
            cmd_decode::run(&config.reader, &input, opts).await
        }
        Commands::Inspect { line } => cmd_inspect::run(&config.reader, &line),
    }
}
