use async_trait::async_trait;

use crate::error::ConnectError;
use crate::results::{BatchResult, ConnectionHealth};
use crate::statement::Statement;

/// Execution backend for upload jobs.
///
/// The uploader drives any implementation of this trait; production uses
/// the Bolt driver client, tests substitute an in-memory fake.
#[async_trait]
pub trait GraphExecutor: Send + Sync {
    /// Establish the connection and verify it with a probe.
    async fn connect(&self) -> Result<(), ConnectError>;

    /// Connection health, served from cache inside the configured window.
    async fn health_check(&self) -> ConnectionHealth;

    /// Execute one batch inside a single transaction, retrying batch-level
    /// failures. The call itself never fails: every error ends up recorded
    /// in the returned result.
    async fn run_batch(
        &self,
        statements: &[Statement],
        batch_number: u64,
        job_id: &str,
    ) -> BatchResult;

    /// Delete all relationships and nodes in bounded rounds; returns the
    /// number of records deleted.
    async fn clear_database(&self) -> Result<u64, ConnectError>;

    /// Release the connection; safe to call when never connected.
    async fn disconnect(&self);
}
