use anyhow::Result;
use cypherload_validate::ValidationService;
use std::path::Path;

use crate::report;

/// Validate the script and report, without any database access.
/// Returns whether the script passed, for the process exit code.
pub fn run(input: &Path, output: Option<&Path>) -> Result<bool> {
    let result = ValidationService::new().validate_file(input);

    report::print_validation(&result);
    if let Some(path) = output {
        report::write_json(path, &result)?;
        println!("  Result written to {}", path.display());
    }
    Ok(result.is_valid)
}
