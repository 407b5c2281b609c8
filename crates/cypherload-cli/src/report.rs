use anyhow::{Context, Result};
use cypherload_core::results::{UploadResult, ValidationResult};
use serde::Serialize;
use std::path::Path;

/// How many errors or warnings to print before eliding the rest.
const MAX_LISTED: usize = 5;

pub fn print_validation(result: &ValidationResult) {
    println!();
    if result.is_valid {
        println!("Validation passed");
    } else {
        println!("Validation failed");
    }
    println!("  File:          {}", result.file_path);
    println!("  Size:          {} bytes", result.file_size_bytes);
    println!("  Statements:    {}", result.total_commands);
    println!("  Est. nodes:    {}", result.estimated_nodes);
    println!("  Est. rels:     {}", result.estimated_relationships);
    print_list("Errors", &result.errors);
    print_list("Warnings", &result.warnings);
}

pub fn print_upload(result: &UploadResult) {
    println!();
    if result.success {
        println!("Upload complete!");
    } else {
        println!("Upload failed");
    }
    println!("  Job ID:        {}", result.job_id);
    println!(
        "  Executed:      {}/{}",
        result.total_commands_executed, result.total_commands
    );
    println!("  Nodes:         {}", result.nodes_created);
    println!("  Relationships: {}", result.relationships_created);
    println!("  Properties:    {}", result.properties_set);
    println!("  Duration:      {:.1}s", result.upload_duration_seconds);
    if !result.failed_commands.is_empty() {
        println!("  Failed stmts:  {}", result.failed_commands.len());
    }
    print_list("Errors", &result.errors);
}

fn print_list(label: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("  {}: {}", label, items.len());
    for item in items.iter().take(MAX_LISTED) {
        println!("    - {item}");
    }
    if items.len() > MAX_LISTED {
        println!("    ... and {} more", items.len() - MAX_LISTED);
    }
}

/// Serialize the result to pretty JSON at `path`.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value).context("Failed to serialize result")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
