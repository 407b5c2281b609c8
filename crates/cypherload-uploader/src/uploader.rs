use std::path::Path;

use tracing::{info, warn};

use cypherload_core::config::UploadConfig;
use cypherload_core::executor::GraphExecutor;
use cypherload_core::metadata::{UploadMetadata, UploadPhase, UploadProgress};
use cypherload_core::results::UploadResult;
use cypherload_core::statement::{Statement, statements_from_commands};
use cypherload_validate::ValidationService;

use crate::reader::StatementReader;

/// Orchestrates one upload job end to end: validation gate, optional
/// pre-upload wipe, streaming batch execution, and verification.
///
/// Generic over the execution backend so tests can substitute an
/// in-memory fake for the driver client.
pub struct BatchUploader<E: GraphExecutor> {
    executor: E,
    validator: ValidationService,
    config: UploadConfig,
}

impl<E: GraphExecutor> BatchUploader<E> {
    pub fn new(executor: E, config: UploadConfig) -> Self {
        Self {
            executor,
            validator: ValidationService::new(),
            config,
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Upload a script file as one job.
    ///
    /// With `validate_before_upload`, an invalid script fails the job
    /// before any connection is attempted. Statements stream from disk;
    /// at most one batch buffer is in memory at a time, regardless of
    /// file size.
    pub async fn upload_from_file(
        &self,
        path: &Path,
        job_id: &str,
        validate_before_upload: bool,
    ) -> UploadResult {
        let mut result = UploadResult::new(job_id);
        let mut metadata = UploadMetadata::new(job_id);

        if validate_before_upload {
            let validation = self.validator.validate_file(path);
            if !validation.is_valid {
                for error in validation.errors {
                    result.add_error(error);
                }
                warn!(job_id, path = %path.display(), "validation failed, upload aborted");
                return self.fail(result, metadata).await;
            }
            for warning in &validation.warnings {
                warn!(job_id, warning = %warning, "dangerous operation in script");
            }
            // Predicted effect, compared against actuals during verification.
            result.estimated_nodes = validation.estimated_nodes;
            result.estimated_relationships = validation.estimated_relationships;
            result.total_commands = validation.total_commands;
            metadata.progress.total_batches =
                Some(total_batches(validation.total_commands, self.config.batch_size));
        }

        if let Err(e) = self.executor.connect().await {
            result.add_error(format!("connection failed ({}): {}", e.kind(), e));
            return self.fail(result, metadata).await;
        }

        if !self.clear_if_requested(job_id, &mut result, &mut metadata).await {
            self.executor.disconnect().await;
            return self.fail(result, metadata).await;
        }

        metadata.transition_to(UploadPhase::Uploading);
        let reader = match StatementReader::open(path) {
            Ok(reader) => reader,
            Err(e) => {
                result.add_error(format!("failed to open {}: {e}", path.display()));
                self.executor.disconnect().await;
                return self.fail(result, metadata).await;
            }
        };
        self.run_batches(reader, job_id, &mut result, &mut metadata.progress)
            .await;

        self.finish(result, metadata).await
    }

    /// Upload statements already held in memory, one per list element.
    /// Same batching and merge semantics as the file path, without the
    /// validation gate or the streaming reader.
    pub async fn upload_from_commands(&self, commands: &[String], job_id: &str) -> UploadResult {
        let mut result = UploadResult::new(job_id);
        let mut metadata = UploadMetadata::new(job_id);

        let statements = statements_from_commands(commands);
        result.total_commands = statements.len() as u64;
        metadata.progress.total_batches =
            Some(total_batches(statements.len() as u64, self.config.batch_size));

        if let Err(e) = self.executor.connect().await {
            result.add_error(format!("connection failed ({}): {}", e.kind(), e));
            return self.fail(result, metadata).await;
        }

        if !self.clear_if_requested(job_id, &mut result, &mut metadata).await {
            self.executor.disconnect().await;
            return self.fail(result, metadata).await;
        }

        metadata.transition_to(UploadPhase::Uploading);
        self.run_batches(
            statements.into_iter().map(Ok),
            job_id,
            &mut result,
            &mut metadata.progress,
        )
        .await;

        self.finish(result, metadata).await
    }

    /// Stream statements into batches and execute them strictly in order.
    ///
    /// A read error stops the stream but keeps everything already
    /// uploaded; batch failures only stop the job when the consecutive
    /// failure limit is configured and reached.
    async fn run_batches<I>(
        &self,
        statements: I,
        job_id: &str,
        result: &mut UploadResult,
        progress: &mut UploadProgress,
    ) where
        I: IntoIterator<Item = std::io::Result<Statement>>,
    {
        let batch_size = self.config.batch_size.max(1);
        let mut buffer: Vec<Statement> = Vec::with_capacity(batch_size);
        let mut batch_number = 0u64;
        let mut streamed = 0u64;
        let mut consecutive_failures = 0u64;

        for item in statements {
            let statement = match item {
                Ok(statement) => statement,
                Err(e) => {
                    result.add_error(format!("script read failed: {e}"));
                    break;
                }
            };
            streamed += 1;
            buffer.push(statement);

            if buffer.len() >= batch_size {
                batch_number += 1;
                let ok = self
                    .flush_batch(&mut buffer, batch_number, job_id, result, progress)
                    .await;
                if self.breaker_tripped(ok, &mut consecutive_failures, result, job_id) {
                    result.total_commands = result.total_commands.max(streamed);
                    return;
                }
            }
        }

        // Non-empty remainder becomes a final, smaller batch.
        if !buffer.is_empty() {
            batch_number += 1;
            self.flush_batch(&mut buffer, batch_number, job_id, result, progress)
                .await;
        }
        result.total_commands = result.total_commands.max(streamed);
    }

    /// Run the buffered statements as one batch and fold the outcome into
    /// the job result. Returns whether the batch succeeded.
    async fn flush_batch(
        &self,
        buffer: &mut Vec<Statement>,
        batch_number: u64,
        job_id: &str,
        result: &mut UploadResult,
        progress: &mut UploadProgress,
    ) -> bool {
        let batch = self.executor.run_batch(buffer, batch_number, job_id).await;
        buffer.clear();

        progress.record_batch(&batch);
        match progress.percent_complete() {
            Some(percent) => info!(
                job_id,
                batch_number,
                executed = batch.commands_executed,
                percent = percent as u64,
                "batch processed"
            ),
            None => info!(
                job_id,
                batch_number,
                executed = batch.commands_executed,
                "batch processed"
            ),
        }

        let success = batch.success;
        result.merge_batch_result(batch);
        success
    }

    /// Track consecutive batch failures against the configured limit.
    /// A limit of zero disables the breaker and keeps the job fail-soft.
    fn breaker_tripped(
        &self,
        batch_ok: bool,
        consecutive_failures: &mut u64,
        result: &mut UploadResult,
        job_id: &str,
    ) -> bool {
        if batch_ok {
            *consecutive_failures = 0;
            return false;
        }
        *consecutive_failures += 1;
        let limit = self.config.max_consecutive_batch_failures;
        if limit > 0 && *consecutive_failures >= limit {
            result.add_error(format!(
                "upload aborted after {limit} consecutive batch failures"
            ));
            warn!(job_id, limit, "consecutive failure limit reached, aborting job");
            return true;
        }
        false
    }

    /// Run the pre-upload wipe when configured. Returns false when the
    /// wipe failed and the job must not proceed.
    async fn clear_if_requested(
        &self,
        job_id: &str,
        result: &mut UploadResult,
        metadata: &mut UploadMetadata,
    ) -> bool {
        if !self.config.clear_before_upload {
            return true;
        }
        metadata.transition_to(UploadPhase::Clearing);
        match self.executor.clear_database().await {
            Ok(deleted) => {
                info!(job_id, deleted, "database cleared before upload");
                true
            }
            Err(e) => {
                result.add_error(format!("clear failed ({}): {}", e.kind(), e));
                false
            }
        }
    }

    /// Verification, the final phase transition, disconnect and the
    /// completion timestamp.
    async fn finish(&self, mut result: UploadResult, mut metadata: UploadMetadata) -> UploadResult {
        metadata.transition_to(UploadPhase::Verification);
        self.verify(&result);

        metadata.transition_to(if result.success {
            UploadPhase::Completed
        } else {
            UploadPhase::Failed
        });
        self.executor.disconnect().await;
        result.finish();
        self.log_completion(&result, &metadata);
        result
    }

    /// Terminal path for jobs that never reach the upload phase.
    async fn fail(&self, mut result: UploadResult, mut metadata: UploadMetadata) -> UploadResult {
        metadata.transition_to(UploadPhase::Failed);
        result.finish();
        self.log_completion(&result, &metadata);
        result
    }

    /// Compare predicted effect against database-reported counters.
    /// Node estimates are one-per-creation and comparable; relationship
    /// estimates deliberately overcount, so they are only logged.
    fn verify(&self, result: &UploadResult) {
        if result.nodes_created < result.estimated_nodes {
            warn!(
                job_id = %result.job_id,
                estimated = result.estimated_nodes,
                created = result.nodes_created,
                "fewer nodes created than estimated"
            );
        }
        info!(
            job_id = %result.job_id,
            nodes = result.nodes_created,
            estimated_nodes = result.estimated_nodes,
            relationships = result.relationships_created,
            estimated_relationships = result.estimated_relationships,
            properties = result.properties_set,
            "verification complete"
        );
    }

    fn log_completion(&self, result: &UploadResult, metadata: &UploadMetadata) {
        info!(
            job_id = %result.job_id,
            success = result.success,
            executed = result.total_commands_executed,
            total = result.total_commands,
            nodes = result.nodes_created,
            relationships = result.relationships_created,
            properties = result.properties_set,
            errors = result.errors.len(),
            duration_seconds = result.upload_duration_seconds,
            phases = metadata.phase_durations.len(),
            "upload finished"
        );
    }
}

fn total_batches(total_commands: u64, batch_size: usize) -> u64 {
    total_commands.div_ceil(batch_size.max(1) as u64)
}
