//! schema-gen: generate a JSON document from a JSON-Schema file under a
//! real tokenizer, printing the result to stdout.

mod backend;
mod config;
mod logging;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use schema_gen_core::{from_json_schema, Generator, TokenBackend};
use tracing_subscriber::EnvFilter;

use crate::backend::TokenizerBackend;

/// Generate a schema-constrained JSON document.
#[derive(Parser, Debug)]
#[command(name = "schema-gen")]
#[command(about = "Generate a JSON document from a JSON-Schema file under token constraints")]
#[command(version)]
struct Args {
    /// Path to a JSON-Schema document.
    #[arg(short, long)]
    schema: PathBuf,

    /// Path to a TOML config file (tokenizer path, default budget, log level).
    #[arg(short, long)]
    config: PathBuf,

    /// Override the configured token budget.
    #[arg(short, long)]
    budget: Option<usize>,

    /// End-of-sequence token text to look up in the tokenizer vocabulary.
    #[arg(long, default_value = "</s>")]
    eos_token: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = config::load_config(&args.config)
        .await
        .with_context(|| format!("failed to load config from {:?}", args.config))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    logging::lifecycle::host_startup(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    logging::lifecycle::config_loaded(&args.config.to_string_lossy());

    let budget = args.budget.unwrap_or(config.default_budget);

    let schema_text = std::fs::read_to_string(&args.schema)
        .with_context(|| format!("failed to read schema from {:?}", args.schema))?;
    let schema_value: serde_json::Value = serde_json::from_str(&schema_text)
        .with_context(|| format!("schema at {:?} is not valid JSON", args.schema))?;
    let schema = from_json_schema(&schema_value)
        .map_err(|e| anyhow::anyhow!("failed to load schema from {:?}: {e}", args.schema))?;
    logging::lifecycle::schema_loaded(&args.schema.to_string_lossy());

    let backend = TokenizerBackend::load(&config.tokenizer_path, &args.eos_token, budget)?;
    logging::lifecycle::tokenizer_loaded(&config.tokenizer_path, backend.vocab_size());

    let ctx = logging::GenerationContext::new(budget);
    let mut generator = Generator::new(backend, &schema)?;
    match generator.generate() {
        Ok(output) => {
            ctx.emit_canonical_log(output.len(), None);
            println!("{output}");
            Ok(())
        }
        Err(error) => {
            ctx.emit_canonical_log(0, Some(&error.to_string()));
            Err(error.into())
        }
    }
}
