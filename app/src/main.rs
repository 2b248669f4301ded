// ==============================================================================
// main.rs - Genetics Predictor Batch CLI
// ==============================================================================
// Description: Runs batch prediction on a local CSV file and prints the JSON payload
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{Read, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use genetics_predictor::{PredictionService, UnseenCategoryPolicy};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input CSV file ("-" reads stdin)
    input: String,

    /// Model bundle path
    #[arg(short, long, env = "MODEL_BUNDLE_PATH", default_value = "model_data.json")]
    bundle: PathBuf,

    /// Replacement for category values unseen during training (first, most-frequent)
    #[arg(long, env = "UNSEEN_CATEGORY_POLICY", default_value = "first")]
    unseen_policy: UnseenCategoryPolicy,

    /// Field delimiter (defaults to tab for .tsv inputs, comma otherwise)
    #[arg(short, long)]
    delimiter: Option<char>,

    /// Maximum input size in megabytes after gzip decompression
    #[arg(long, env = "MAX_DECOMPRESSED_MB", default_value_t = 256)]
    max_input_mb: u64,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "genetics_predictor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let delimiter = match args.delimiter {
        Some(c) if c.is_ascii() => c as u8,
        Some(c) => anyhow::bail!("Delimiter must be a single ASCII character, got '{}'", c),
        None if args.input.to_lowercase().ends_with(".tsv") => b'\t',
        None => b',',
    };

    let data = if args.input == "-" {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        std::fs::read(&args.input).with_context(|| format!("Failed to read {}", args.input))?
    };

    info!(input = %args.input, bytes = data.len(), "Input loaded");

    let service = PredictionService::load(&args.bundle, args.unseen_policy)
        .with_max_input_bytes(args.max_input_mb.saturating_mul(1024 * 1024));
    let response = service.respond(Some(data.as_slice()), delimiter);

    let json = if args.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", json).context("Failed to write output")?;
    stdout.flush()?;

    if !response.is_success() {
        std::process::exit(1);
    }

    Ok(())
}
