//! End-to-end pipeline tests: validation gate, batch streaming, result
//! merging, and the JSON artifact shape consumed by orchestrating services.
//!
//! The database is replaced by a recording executor; driver behavior is
//! covered by the client crate's own tests.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use cypherload_core::config::UploadConfig;
use cypherload_core::error::ConnectError;
use cypherload_core::executor::GraphExecutor;
use cypherload_core::results::{BatchResult, ConnectionHealth};
use cypherload_core::statement::Statement;
use cypherload_uploader::BatchUploader;
use cypherload_validate::ValidationService;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Absolute path to the social graph fixture script.
fn fixture_path() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .join("../../testdata/fixtures/social_graph.cypher")
        .canonicalize()
        .expect("fixture script must exist at testdata/fixtures/social_graph.cypher")
}

fn write_script(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp script");
    file.write_all(content.as_bytes()).expect("write temp script");
    file.flush().expect("flush temp script");
    file
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Connect,
    Batch { number: u64, size: usize },
    Disconnect,
}

/// Executor that records every call and reports every statement as having
/// created one node and two properties.
#[derive(Default)]
struct RecordingExecutor {
    calls: Mutex<Vec<Call>>,
}

impl RecordingExecutor {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn batches(&self) -> Vec<(u64, usize)> {
        self.calls()
            .iter()
            .filter_map(|c| match c {
                Call::Batch { number, size } => Some((*number, *size)),
                _ => None,
            })
            .collect()
    }

    fn connect_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| **c == Call::Connect)
            .count()
    }
}

#[async_trait]
impl GraphExecutor for RecordingExecutor {
    async fn connect(&self) -> Result<(), ConnectError> {
        self.calls.lock().unwrap().push(Call::Connect);
        Ok(())
    }

    async fn health_check(&self) -> ConnectionHealth {
        ConnectionHealth::ok(1, None)
    }

    async fn run_batch(
        &self,
        statements: &[Statement],
        batch_number: u64,
        _job_id: &str,
    ) -> BatchResult {
        self.calls.lock().unwrap().push(Call::Batch {
            number: batch_number,
            size: statements.len(),
        });
        let mut batch = BatchResult::new(batch_number, statements.len() as u64);
        batch.commands_executed = statements.len() as u64;
        batch.nodes_created = statements.len() as u64;
        batch.properties_set = statements.len() as u64 * 2;
        batch
    }

    async fn clear_database(&self) -> Result<u64, ConnectError> {
        Ok(0)
    }

    async fn disconnect(&self) {
        self.calls.lock().unwrap().push(Call::Disconnect);
    }
}

fn uploader(batch_size: usize) -> BatchUploader<RecordingExecutor> {
    let config = UploadConfig {
        batch_size,
        ..UploadConfig::default()
    };
    BatchUploader::new(RecordingExecutor::default(), config)
}

// ===========================================================================
// Validation of the fixture script
// ===========================================================================

#[test]
fn test_fixture_validates_with_expected_estimates() {
    let result = ValidationService::new().validate_file(&fixture_path());

    assert!(result.is_valid, "fixture must validate, errors: {:?}", result.errors);
    assert_eq!(result.total_commands, 6);
    assert_eq!(result.estimated_nodes, 6);
    // Each MATCH..CREATE relationship statement counts twice: once for the
    // arrow, once for the full creation pattern.
    assert_eq!(result.estimated_relationships, 4);
    assert!(result.warnings.is_empty(), "fixture has no dangerous operations");
    assert!(result.file_size_bytes > 0);
}

#[test]
fn test_unbalanced_script_fails_validation() {
    let file = write_script("CREATE (a:Person {name: 'Alice'};\n");
    let result = ValidationService::new().validate_file(file.path());

    assert!(!result.is_valid);
    assert!(
        result.errors.iter().any(|e| e.contains("unbalanced parentheses")),
        "expected an unbalanced parentheses error, got: {:?}",
        result.errors
    );
}

// ===========================================================================
// Upload pipeline against the recording executor
// ===========================================================================

#[tokio::test]
async fn test_fixture_uploads_in_order_with_batches_of_two() {
    let up = uploader(2);

    let result = up.upload_from_file(&fixture_path(), "it-upload", true).await;

    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.total_commands, 6);
    assert_eq!(result.total_commands_executed, 6);
    assert_eq!(result.nodes_created, 6);
    assert_eq!(result.properties_set, 12);
    assert_eq!(result.estimated_nodes, 6);
    assert_eq!(result.estimated_relationships, 4);
    assert!(result.completed_at.is_some());

    let calls = up.executor().calls();
    assert_eq!(calls.first(), Some(&Call::Connect));
    assert_eq!(calls.last(), Some(&Call::Disconnect));
    assert_eq!(up.executor().batches(), vec![(1, 2), (2, 2), (3, 2)]);
}

#[tokio::test]
async fn test_invalid_script_never_reaches_the_executor() {
    let file = write_script("CREATE (a:Person\nRETURN broken;\n");
    let up = uploader(100);

    let result = up.upload_from_file(file.path(), "it-gate", true).await;

    assert!(!result.success);
    assert_eq!(up.executor().connect_calls(), 0);
    assert!(up.executor().calls().is_empty());
}

#[tokio::test]
async fn test_large_script_streams_in_batch_sized_chunks() {
    let mut content = String::new();
    for i in 0..250 {
        content.push_str(&format!("CREATE (n:Bulk {{id: {i}}});\n"));
    }
    let file = write_script(&content);
    let up = uploader(100);

    let result = up.upload_from_file(file.path(), "it-bulk", true).await;

    assert!(result.success);
    assert_eq!(result.total_commands, 250);
    assert_eq!(result.total_commands_executed, 250);
    assert_eq!(up.executor().batches(), vec![(1, 100), (2, 100), (3, 50)]);
}

#[tokio::test]
async fn test_dangerous_statement_warns_but_uploads() {
    let file = write_script("CREATE (a:Person {name: 'Alice'});\nDROP DATABASE neo4j;\n");

    let validation = ValidationService::new().validate_file(file.path());
    assert!(validation.is_valid);
    assert!(
        validation.warnings.iter().any(|w| w.contains("DROP DATABASE")),
        "expected a DROP DATABASE warning, got: {:?}",
        validation.warnings
    );

    let up = uploader(100);
    let result = up.upload_from_file(file.path(), "it-danger", true).await;
    assert!(result.success);
    assert_eq!(result.total_commands_executed, 2);
}

// ===========================================================================
// JSON artifact shape
// ===========================================================================

#[test]
fn test_validation_result_json_uses_stable_field_names() {
    let result = ValidationService::new().validate_file(&fixture_path());
    let value = serde_json::to_value(&result).expect("serialize validation result");
    let object = value.as_object().expect("validation result is a JSON object");

    for field in [
        "is_valid",
        "file_path",
        "file_size_bytes",
        "total_commands",
        "estimated_nodes",
        "estimated_relationships",
        "errors",
        "warnings",
    ] {
        assert!(
            object.contains_key(field),
            "expected field '{field}', got: {:?}",
            object.keys().collect::<Vec<_>>()
        );
    }
}

#[tokio::test]
async fn test_upload_result_json_uses_stable_field_names() {
    let up = uploader(2);
    let result = up.upload_from_file(&fixture_path(), "it-json", true).await;

    let value = serde_json::to_value(&result).expect("serialize upload result");
    let object = value.as_object().expect("upload result is a JSON object");

    for field in [
        "job_id",
        "success",
        "nodes_created",
        "relationships_created",
        "properties_set",
        "total_commands",
        "total_commands_executed",
        "estimated_nodes",
        "estimated_relationships",
        "errors",
        "failed_commands",
        "started_at",
        "completed_at",
        "upload_duration_seconds",
    ] {
        assert!(
            object.contains_key(field),
            "expected field '{field}', got: {:?}",
            object.keys().collect::<Vec<_>>()
        );
    }
    assert_eq!(object["job_id"], "it-json");
    assert_eq!(object["success"], true);
}
