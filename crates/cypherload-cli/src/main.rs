mod commands;
mod report;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "cypherload",
    version,
    about = "Batch upload Cypher scripts into Neo4j",
    long_about = "Cypherload validates Cypher scripts without touching the database, then\n\
        streams them into Neo4j in bounded transactional batches with retry,\n\
        per-statement error capture, and a JSON result artifact.\n\n\
        Quick start:\n  \
        cypherload --input data.cypher --job-id nightly-42\n  \
        cypherload --input data.cypher --job-id precheck --validate-only\n  \
        cypherload --input data.cypher --job-id rebuild --clear-database true"
)]
struct Cli {
    /// Path to the Cypher script to upload
    #[arg(short, long)]
    input: PathBuf,

    /// Job identifier assigned by the caller, stamped on every result
    #[arg(short, long)]
    job_id: String,

    /// Write the full result as JSON to this path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Statements per transaction (default from config: 100)
    #[arg(long)]
    batch_size: Option<usize>,

    /// Validate the script and exit without uploading
    #[arg(long)]
    validate_only: bool,

    /// Wipe the target database before uploading
    #[arg(long)]
    clear_database: Option<bool>,

    /// Bolt URI override (e.g. 127.0.0.1:7687)
    #[arg(long)]
    neo4j_uri: Option<String>,

    /// Path to config file (default: ~/.cypherload/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging (set log level to debug)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let mut config = cypherload_core::config::Config::load_with_file(cli.config.as_deref())?;
    if let Some(batch_size) = cli.batch_size {
        config.upload.batch_size = batch_size;
    }
    if let Some(clear) = cli.clear_database {
        config.upload.clear_before_upload = clear;
    }
    if let Some(uri) = cli.neo4j_uri {
        config.neo4j.uri = uri;
    }
    config.validate()?;

    let ok = if cli.validate_only {
        commands::validate::run(&cli.input, cli.output.as_deref())?
    } else {
        commands::upload::run(&cli.input, &cli.job_id, cli.output.as_deref(), &config)?
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
