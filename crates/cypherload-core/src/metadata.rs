use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::results::BatchResult;

/// Lifecycle phase of an upload job. `Failed` is reachable from any phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    Validation,
    Backup,
    Clearing,
    Uploading,
    Verification,
    Completed,
    Failed,
}

impl UploadPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Backup => "backup",
            Self::Clearing => "clearing",
            Self::Uploading => "uploading",
            Self::Verification => "verification",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for UploadPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time spent in one completed phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseDuration {
    pub phase: UploadPhase,
    pub duration_seconds: f64,
}

/// Live bookkeeping for one job: current phase, per-phase durations, and
/// running batch progress. Distinct from the final `UploadResult`, which
/// only carries the aggregate outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadMetadata {
    pub job_id: String,
    pub phase: UploadPhase,
    pub started_at: DateTime<Utc>,
    pub phase_started_at: DateTime<Utc>,
    pub phase_durations: Vec<PhaseDuration>,
    pub progress: UploadProgress,
}

impl UploadMetadata {
    pub fn new(job_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            job_id: job_id.into(),
            phase: UploadPhase::Validation,
            started_at: now,
            phase_started_at: now,
            phase_durations: Vec::new(),
            progress: UploadProgress::default(),
        }
    }

    /// Leave the current phase, stamping its duration, and enter `next`.
    pub fn transition_to(&mut self, next: UploadPhase) {
        let now = Utc::now();
        let spent = (now - self.phase_started_at).num_milliseconds() as f64 / 1000.0;
        self.phase_durations.push(PhaseDuration {
            phase: self.phase,
            duration_seconds: spent,
        });
        info!(
            job_id = %self.job_id,
            from = %self.phase,
            to = %next,
            spent_seconds = spent,
            "Phase transition"
        );
        self.phase = next;
        self.phase_started_at = now;
    }
}

/// Running totals while batches execute.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadProgress {
    pub current_batch: u64,
    pub total_batches: Option<u64>,
    pub commands_processed: u64,
    pub nodes_created: u64,
    pub relationships_created: u64,
    pub properties_set: u64,
}

impl UploadProgress {
    /// Fold one finished batch into the running totals.
    pub fn record_batch(&mut self, batch: &BatchResult) {
        self.current_batch = batch.batch_number;
        self.commands_processed += batch.commands_in_batch;
        self.nodes_created += batch.nodes_created;
        self.relationships_created += batch.relationships_created;
        self.properties_set += batch.properties_set;
    }

    /// Percent of batches finished, when the total is known up front.
    pub fn percent_complete(&self) -> Option<f64> {
        self.total_batches
            .filter(|total| *total > 0)
            .map(|total| self.current_batch as f64 * 100.0 / total as f64)
    }
}
