use std::time::{Duration, Instant};

use async_trait::async_trait;
use neo4rs::{ConfigBuilder, Graph, Txn, query};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use cypherload_core::config::Neo4jConfig;
use cypherload_core::constants::{CLEAR_BATCH_SIZE, MAX_BATCH_ATTEMPTS};
use cypherload_core::error::ConnectError;
use cypherload_core::executor::GraphExecutor;
use cypherload_core::results::{BatchResult, ConnectionHealth, UploadResult};
use cypherload_core::statement::Statement;

use crate::classify::classify_connect_error;
use crate::retry::run_with_backoff;
use crate::stats::{ClientStats, StatsSnapshot};

/// Bolt driver client: owns the live connection, executes batches inside
/// explicit transactions with retry, and serves throttled health checks.
///
/// All methods take `&self`; the connection handle, health cache and
/// counters are individually guarded so one instance can back several
/// concurrently running jobs.
pub struct Neo4jClient {
    config: Neo4jConfig,
    graph: RwLock<Option<Graph>>,
    health: Mutex<Option<ConnectionHealth>>,
    stats: ClientStats,
}

/// Batch-level failure inside one attempt: no connection, or a driver
/// error from transaction begin/commit. Per-statement failures never
/// become this; they are recorded in the batch result instead.
#[derive(Debug)]
enum BatchError {
    NotConnected,
    Driver(neo4rs::Error),
}

impl std::fmt::Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConnected => f.write_str("not connected"),
            Self::Driver(e) => write!(f, "{e}"),
        }
    }
}

impl From<neo4rs::Error> for BatchError {
    fn from(e: neo4rs::Error) -> Self {
        Self::Driver(e)
    }
}

/// Creation counters reported by one statement's execution summary.
struct StatementCounters {
    nodes_created: u64,
    relationships_created: u64,
    properties_set: u64,
}

impl Neo4jClient {
    pub fn new(config: Neo4jConfig) -> Self {
        Self {
            config,
            graph: RwLock::new(None),
            health: Mutex::new(None),
            stats: ClientStats::default(),
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Open the driver pool and verify it with a probe.
    ///
    /// The probe result seeds the health cache, so a `health_check`
    /// immediately after connecting does not pay a second round trip.
    /// Failures come back classified; nothing is stored on failure.
    pub async fn connect(&self) -> Result<(), ConnectError> {
        let driver_config = ConfigBuilder::default()
            .uri(self.config.uri.as_str())
            .user(self.config.username.as_str())
            .password(self.config.password.as_str())
            .db(self.config.database.as_str())
            .max_connections(self.config.max_connections)
            .build()
            .map_err(|e| classify_connect_error(&e.to_string()))?;

        let graph = tokio::time::timeout(
            Duration::from_secs(self.config.connect_timeout_secs),
            std::future::ready(Graph::connect(driver_config)),
        )
        .await
        .map_err(|_| {
            ConnectError::Timeout(format!(
                "no connection to {} within {}s",
                self.config.uri, self.config.connect_timeout_secs
            ))
        })?
        .map_err(|e| classify_connect_error(&e.to_string()))?;

        let health = self.probe(&graph).await;
        let outcome = if health.healthy {
            Ok(())
        } else {
            Err(classify_connect_error(
                health.error.as_deref().unwrap_or("probe failed"),
            ))
        };
        *self.health.lock().await = Some(health);

        if outcome.is_ok() {
            *self.graph.write().await = Some(graph);
            info!(uri = %self.config.uri, database = %self.config.database, "connected");
        }
        outcome
    }

    /// Connection health, recomputed only when the cache window has
    /// elapsed since the last check. Failed probes are cached like
    /// healthy ones, so a down database is not hammered either.
    pub async fn health_check(&self) -> ConnectionHealth {
        let mut cached = self.health.lock().await;
        if let Some(health) = cached.as_ref()
            && health.is_fresh(self.config.health_check_interval_secs)
        {
            debug!(healthy = health.healthy, "health served from cache");
            return health.clone();
        }

        let health = {
            let graph_guard = self.graph.read().await;
            match graph_guard.as_ref() {
                Some(graph) => self.probe(graph).await,
                None => ConnectionHealth::failed("not connected"),
            }
        };
        *cached = Some(health.clone());
        health
    }

    /// One `RETURN 1` round trip, timed. The version lookup afterwards is
    /// best-effort; a database that hides its version is still healthy.
    async fn probe(&self, graph: &Graph) -> ConnectionHealth {
        let started = Instant::now();
        let probe_timeout = Duration::from_secs(self.config.probe_timeout_secs);

        match tokio::time::timeout(probe_timeout, graph.run(query("RETURN 1"))).await {
            Ok(Ok(_)) => {
                let response_time_ms = started.elapsed().as_millis() as u64;
                let version = server_version(graph).await;
                debug!(response_time_ms, version = version.as_deref(), "probe succeeded");
                ConnectionHealth::ok(response_time_ms, version)
            }
            Ok(Err(e)) => {
                ConnectionHealth::failed(classify_connect_error(&e.to_string()).to_string())
            }
            Err(_) => ConnectionHealth::failed(format!(
                "health probe timed out after {}s",
                self.config.probe_timeout_secs
            )),
        }
    }

    /// Execute one batch with retry.
    ///
    /// Batch-level failures (no connection, transaction begin/commit)
    /// are retried up to [`MAX_BATCH_ATTEMPTS`] times with backoff; each
    /// attempt starts from a fresh result so a retried batch carries no
    /// stale error records. Exhausting the attempts records the batch as
    /// failed; the caller's job continues.
    pub async fn run_batch(
        &self,
        statements: &[Statement],
        batch_number: u64,
        job_id: &str,
    ) -> BatchResult {
        let started = Instant::now();

        let outcome = run_with_backoff("batch execution", MAX_BATCH_ATTEMPTS, |attempt| {
            if attempt > 1 {
                self.stats.record_retry();
            }
            self.run_batch_once(statements, batch_number)
        })
        .await;

        let mut batch = match outcome {
            Ok(batch) => batch,
            Err(e) => BatchResult::failed(
                batch_number,
                statements.len() as u64,
                format!("batch {batch_number} failed after {MAX_BATCH_ATTEMPTS} attempts: {e}"),
            ),
        };
        batch.execution_time_seconds = started.elapsed().as_secs_f64();
        self.stats.record_batch();

        debug!(
            job_id,
            batch_number,
            commands = batch.commands_in_batch,
            executed = batch.commands_executed,
            success = batch.success,
            "batch finished"
        );
        batch
    }

    /// One transactional attempt. Statement failures are caught and
    /// recorded; execution continues with the next statement in the same
    /// transaction. A commit failure after recorded statement errors
    /// surfaces as a batch-level error and feeds the retry path.
    async fn run_batch_once(
        &self,
        statements: &[Statement],
        batch_number: u64,
    ) -> Result<BatchResult, BatchError> {
        let graph_guard = self.graph.read().await;
        let graph = graph_guard.as_ref().ok_or(BatchError::NotConnected)?;

        let mut batch = BatchResult::new(batch_number, statements.len() as u64);
        let mut txn = graph.start_txn().await?;

        for statement in statements {
            self.stats.record_statement();
            match run_statement(&mut txn, statement).await {
                Ok(counters) => {
                    batch.commands_executed += 1;
                    batch.nodes_created += counters.nodes_created;
                    batch.relationships_created += counters.relationships_created;
                    batch.properties_set += counters.properties_set;
                }
                Err(e) => {
                    self.stats.record_statement_failure();
                    warn!(batch_number, line = statement.line(), error = %e, "statement failed");
                    batch.add_failed_command(statement, e.to_string());
                }
            }
        }

        txn.commit().await?;
        Ok(batch)
    }

    /// Standalone batch entry point: health-gates first, then chunks and
    /// executes sequentially in order, merging as results arrive. Serves
    /// callers that already hold their statements; the uploader builds on
    /// [`Self::run_batch`] and merges per-batch results itself.
    pub async fn execute_cypher_batch(
        &self,
        statements: &[Statement],
        batch_size: usize,
        job_id: &str,
    ) -> UploadResult {
        let mut result = UploadResult::new(job_id);
        result.total_commands = statements.len() as u64;

        let health = self.health_check().await;
        if !health.healthy {
            result.add_error(format!(
                "database unhealthy, refusing to execute: {}",
                health.error.as_deref().unwrap_or("unknown")
            ));
            result.finish();
            return result;
        }

        let batch_size = batch_size.max(1);
        let total = statements.len();
        let mut processed = 0usize;

        for (index, chunk) in statements.chunks(batch_size).enumerate() {
            let batch = self.run_batch(chunk, index as u64 + 1, job_id).await;
            processed += chunk.len();
            info!(
                job_id,
                batch_number = index as u64 + 1,
                processed,
                total,
                percent = processed * 100 / total,
                "batch processed"
            );
            result.merge_batch_result(batch);
        }

        result.finish();
        result
    }

    /// Wipe the database in bounded rounds, relationships before nodes,
    /// so giant graphs never go through one giant transaction. Returns
    /// the number of records deleted.
    pub async fn clear_database(&self) -> Result<u64, ConnectError> {
        let graph_guard = self.graph.read().await;
        let graph = graph_guard
            .as_ref()
            .ok_or_else(|| ConnectError::Other("not connected".into()))?;

        let relationships = delete_rounds(
            graph,
            "MATCH ()-[r]->() WITH r LIMIT $batch DELETE r RETURN count(r) AS deleted",
        )
        .await?;
        let nodes = delete_rounds(
            graph,
            "MATCH (n) WITH n LIMIT $batch DETACH DELETE n RETURN count(n) AS deleted",
        )
        .await?;

        info!(relationships, nodes, "database cleared");
        Ok(relationships + nodes)
    }

    /// Drop the pool handle. Safe to call when never connected.
    pub async fn disconnect(&self) {
        if self.graph.write().await.take().is_some() {
            info!("disconnected");
        }
    }
}

#[async_trait]
impl GraphExecutor for Neo4jClient {
    async fn connect(&self) -> Result<(), ConnectError> {
        Neo4jClient::connect(self).await
    }

    async fn health_check(&self) -> ConnectionHealth {
        Neo4jClient::health_check(self).await
    }

    async fn run_batch(
        &self,
        statements: &[Statement],
        batch_number: u64,
        job_id: &str,
    ) -> BatchResult {
        Neo4jClient::run_batch(self, statements, batch_number, job_id).await
    }

    async fn clear_database(&self) -> Result<u64, ConnectError> {
        Neo4jClient::clear_database(self).await
    }

    async fn disconnect(&self) {
        Neo4jClient::disconnect(self).await
    }
}

/// Run one statement inside the transaction and pull the creation
/// counters from its execution summary. The only place summary types are
/// touched.
async fn run_statement(
    txn: &mut Txn,
    statement: &Statement,
) -> Result<StatementCounters, neo4rs::Error> {
    let stream = txn.execute(query(statement.text())).await?;
    let summary = stream.finish(&mut *txn).await?;
    let counters = summary.stats();
    Ok(StatementCounters {
        nodes_created: counters.nodes_created as u64,
        relationships_created: counters.relationships_created as u64,
        properties_set: counters.properties_set as u64,
    })
}

/// Best-effort server version; absence is not an error.
async fn server_version(graph: &Graph) -> Option<String> {
    let q = query(
        "CALL dbms.components() YIELD name, versions RETURN versions[0] AS version LIMIT 1",
    );
    let mut rows = graph.execute(q).await.ok()?;
    let row = rows.next().await.ok()??;
    row.get::<String>("version").ok()
}

/// Run a bounded delete query until it reports zero deletions.
async fn delete_rounds(graph: &Graph, cypher: &str) -> Result<u64, ConnectError> {
    let mut total = 0u64;
    loop {
        let q = query(cypher).param("batch", CLEAR_BATCH_SIZE);
        let mut rows = graph.execute(q).await.map_err(ConnectError::other)?;
        let deleted: i64 = match rows.next().await.map_err(ConnectError::other)? {
            Some(row) => row.get("deleted").map_err(ConnectError::other)?,
            None => 0,
        };
        if deleted <= 0 {
            return Ok(total);
        }
        total += deleted as u64;
        debug!(deleted, "clear round");
    }
}
