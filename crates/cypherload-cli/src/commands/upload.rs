use anyhow::{Context, Result};
use cypherload_client::Neo4jClient;
use cypherload_core::config::Config;
use cypherload_uploader::BatchUploader;
use std::path::Path;
use tracing::info;

use crate::report;

/// Run one upload job end to end and report. Validation runs first and an
/// invalid script aborts before any connection is made. Returns whether
/// the job succeeded, for the process exit code.
pub fn run(input: &Path, job_id: &str, output: Option<&Path>, config: &Config) -> Result<bool> {
    let client = Neo4jClient::new(config.neo4j.clone());
    let uploader = BatchUploader::new(client, config.upload.clone());

    println!(
        "Uploading {} (job: {}, batch size: {}) ...",
        input.display(),
        job_id,
        config.upload.batch_size
    );

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    let result = rt.block_on(uploader.upload_from_file(input, job_id, true));

    report::print_upload(&result);
    if let Some(path) = output {
        report::write_json(path, &result)?;
        println!("  Result written to {}", path.display());
    }
    info!(
        job_id,
        success = result.success,
        executed = result.total_commands_executed,
        "Upload job finished"
    );
    Ok(result.success)
}
