use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::STATEMENT_PREVIEW_CHARS;
use crate::statement::Statement;

/// Outcome of statically checking a script before upload.
///
/// Errors make the script invalid; warnings (dangerous operations) never
/// do. The caller decides whether a warned script still gets uploaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub file_path: String,
    pub file_size_bytes: u64,
    pub total_commands: u64,
    pub estimated_nodes: u64,
    pub estimated_relationships: u64,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            file_path: file_path.into(),
            file_size_bytes: 0,
            total_commands: 0,
            estimated_nodes: 0,
            estimated_relationships: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Record an error; a result with any error is invalid.
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.is_valid = false;
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// One statement that failed during execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedCommand {
    pub command: String,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of one transactional batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub batch_number: u64,
    pub commands_in_batch: u64,
    pub commands_executed: u64,
    pub nodes_created: u64,
    pub relationships_created: u64,
    pub properties_set: u64,
    pub execution_time_seconds: f64,
    pub errors: Vec<String>,
    pub failed_commands: Vec<FailedCommand>,
    pub success: bool,
}

impl BatchResult {
    pub fn new(batch_number: u64, commands_in_batch: u64) -> Self {
        Self {
            batch_number,
            commands_in_batch,
            commands_executed: 0,
            nodes_created: 0,
            relationships_created: 0,
            properties_set: 0,
            execution_time_seconds: 0.0,
            errors: Vec::new(),
            failed_commands: Vec::new(),
            success: true,
        }
    }

    /// A batch whose attempts were all exhausted without a commit.
    pub fn failed(batch_number: u64, commands_in_batch: u64, error: impl Into<String>) -> Self {
        let mut batch = Self::new(batch_number, commands_in_batch);
        batch.add_error(error);
        batch
    }

    /// Record a batch-level error; a batch with any error is unsuccessful.
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.success = false;
    }

    /// Record one failing statement without aborting its siblings.
    pub fn add_failed_command(&mut self, statement: &Statement, error: impl Into<String>) {
        let error = error.into();
        let preview = statement.preview(STATEMENT_PREVIEW_CHARS);
        self.errors.push(format!(
            "line {}: statement failed: {}: {}",
            statement.line(),
            error,
            preview
        ));
        self.success = false;
        self.failed_commands.push(FailedCommand {
            command: preview,
            error,
            timestamp: Utc::now(),
        });
    }
}

/// Aggregated outcome of one upload job.
///
/// Counters are exactly the sum of all merged batches; `success` is
/// monotone: once any batch fails it stays false for the rest of the job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResult {
    pub job_id: String,
    pub success: bool,
    pub nodes_created: u64,
    pub relationships_created: u64,
    pub properties_set: u64,
    pub total_commands: u64,
    pub total_commands_executed: u64,
    pub estimated_nodes: u64,
    pub estimated_relationships: u64,
    pub errors: Vec<String>,
    pub failed_commands: Vec<FailedCommand>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub upload_duration_seconds: f64,
}

impl UploadResult {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            success: true,
            nodes_created: 0,
            relationships_created: 0,
            properties_set: 0,
            total_commands: 0,
            total_commands_executed: 0,
            estimated_nodes: 0,
            estimated_relationships: 0,
            errors: Vec::new(),
            failed_commands: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
            upload_duration_seconds: 0.0,
        }
    }

    /// Fold one batch into the aggregate: counters add, errors and failed
    /// commands append, one failed batch fails the job for good.
    pub fn merge_batch_result(&mut self, batch: BatchResult) {
        self.nodes_created += batch.nodes_created;
        self.relationships_created += batch.relationships_created;
        self.properties_set += batch.properties_set;
        self.total_commands_executed += batch.commands_executed;
        self.errors.extend(batch.errors);
        self.failed_commands.extend(batch.failed_commands);
        if !batch.success {
            self.success = false;
        }
    }

    /// Record a job-level error (gate failures, aborted streams).
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.success = false;
    }

    /// Stamp completion time and wall-clock duration.
    pub fn finish(&mut self) {
        let now = Utc::now();
        self.upload_duration_seconds = (now - self.started_at).num_milliseconds() as f64 / 1000.0;
        self.completed_at = Some(now);
    }
}

/// Point-in-time connection health, cached between probes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionHealth {
    pub healthy: bool,
    pub last_check: DateTime<Utc>,
    pub response_time_ms: u64,
    pub database_version: Option<String>,
    pub error: Option<String>,
}

impl ConnectionHealth {
    pub fn ok(response_time_ms: u64, database_version: Option<String>) -> Self {
        Self {
            healthy: true,
            last_check: Utc::now(),
            response_time_ms,
            database_version,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            healthy: false,
            last_check: Utc::now(),
            response_time_ms: 0,
            database_version: None,
            error: Some(error.into()),
        }
    }

    /// True while this result is still inside the cache window.
    pub fn is_fresh(&self, window_secs: u64) -> bool {
        let age = Utc::now().signed_duration_since(self.last_check);
        age.num_seconds() < window_secs as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_batch(batch_number: u64, nodes: u64, relationships: u64, properties: u64) -> BatchResult {
        let mut batch = BatchResult::new(batch_number, 10);
        batch.commands_executed = 10;
        batch.nodes_created = nodes;
        batch.relationships_created = relationships;
        batch.properties_set = properties;
        batch
    }

    fn counters(result: &UploadResult) -> (u64, u64, u64, u64) {
        (
            result.nodes_created,
            result.relationships_created,
            result.properties_set,
            result.total_commands_executed,
        )
    }

    #[test]
    fn test_validation_add_error_flips_is_valid() {
        let mut result = ValidationResult::new("script.cypher");
        assert!(result.is_valid);
        result.add_error("line 1: unbalanced parentheses");
        assert!(!result.is_valid);
        assert_eq!(result.is_valid, result.errors.is_empty());
    }

    #[test]
    fn test_validation_warnings_keep_valid() {
        let mut result = ValidationResult::new("script.cypher");
        result.add_warning("line 3: dangerous operation (DROP DATABASE)");
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_batch_success_tracks_errors() {
        let mut batch = BatchResult::new(1, 5);
        assert!(batch.success);
        batch.add_error("transaction commit failed");
        assert!(!batch.success);
        assert_eq!(batch.success, batch.errors.is_empty());
    }

    #[test]
    fn test_failed_command_truncates_statement() {
        let mut batch = BatchResult::new(1, 1);
        let statement = Statement::new("C".repeat(400), 7);
        batch.add_failed_command(&statement, "syntax error");

        assert_eq!(batch.failed_commands.len(), 1);
        assert_eq!(batch.failed_commands[0].command.chars().count(), 203);
        assert_eq!(batch.failed_commands[0].error, "syntax error");
        assert!(batch.errors[0].starts_with("line 7:"));
        assert!(!batch.success);
    }

    #[test]
    fn test_merge_accumulates_counters() {
        let mut result = UploadResult::new("job-1");
        result.merge_batch_result(sample_batch(1, 3, 2, 9));
        result.merge_batch_result(sample_batch(2, 1, 0, 4));

        assert_eq!(result.nodes_created, 4);
        assert_eq!(result.relationships_created, 2);
        assert_eq!(result.properties_set, 13);
        assert_eq!(result.total_commands_executed, 20);
        assert!(result.success);
    }

    #[test]
    fn test_merge_is_associative_and_commutative() {
        let a = sample_batch(1, 3, 1, 7);
        let b = sample_batch(2, 5, 2, 0);
        let c = sample_batch(3, 11, 0, 2);

        // ([A, B]) then C
        let mut left = UploadResult::new("job");
        left.merge_batch_result(a.clone());
        left.merge_batch_result(b.clone());
        left.merge_batch_result(c.clone());

        // A then ([B, C])
        let mut right = UploadResult::new("job");
        right.merge_batch_result(a.clone());
        let mut rest = UploadResult::new("job");
        rest.merge_batch_result(b.clone());
        rest.merge_batch_result(c.clone());
        right.merge_batch_result(sample_batch(0, rest.nodes_created, rest.relationships_created, rest.properties_set));

        assert_eq!(left.nodes_created, right.nodes_created);
        assert_eq!(left.relationships_created, right.relationships_created);
        assert_eq!(left.properties_set, right.properties_set);

        // Order of arrival does not change the aggregate counters.
        let mut forward = UploadResult::new("job");
        forward.merge_batch_result(a.clone());
        forward.merge_batch_result(b.clone());
        let mut reversed = UploadResult::new("job");
        reversed.merge_batch_result(b);
        reversed.merge_batch_result(a);
        assert_eq!(counters(&forward), counters(&reversed));
    }

    #[test]
    fn test_merge_failure_is_monotonic() {
        let mut result = UploadResult::new("job-1");
        result.merge_batch_result(BatchResult::failed(1, 10, "batch 1 failed after 3 attempts"));
        assert!(!result.success);

        result.merge_batch_result(sample_batch(2, 5, 0, 0));
        assert!(!result.success, "success must never reset to true");
        assert_eq!(result.nodes_created, 5);
    }

    #[test]
    fn test_finish_stamps_completion() {
        let mut result = UploadResult::new("job-1");
        assert!(result.completed_at.is_none());
        result.finish();
        assert!(result.completed_at.is_some());
        assert!(result.upload_duration_seconds >= 0.0);
    }

    #[test]
    fn test_upload_result_json_field_names() {
        let mut result = UploadResult::new("job-9");
        result.merge_batch_result(sample_batch(1, 2, 1, 3));
        result.finish();

        let value = serde_json::to_value(&result).unwrap();
        for field in [
            "job_id",
            "success",
            "nodes_created",
            "relationships_created",
            "properties_set",
            "total_commands",
            "total_commands_executed",
            "errors",
            "failed_commands",
            "started_at",
            "completed_at",
            "upload_duration_seconds",
        ] {
            assert!(value.get(field).is_some(), "missing field: {field}");
        }
        assert_eq!(value["job_id"], "job-9");
        assert_eq!(value["nodes_created"], 2);
    }

    #[test]
    fn test_connection_health_freshness() {
        let health = ConnectionHealth::ok(12, Some("5.13.0".into()));
        assert!(health.healthy);
        assert!(health.is_fresh(300));
        assert!(!health.is_fresh(0), "zero window means always stale");

        let failed = ConnectionHealth::failed("connection refused");
        assert!(!failed.healthy);
        assert_eq!(failed.error.as_deref(), Some("connection refused"));
    }
}
