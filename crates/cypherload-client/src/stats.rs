use std::sync::atomic::{AtomicU64, Ordering};

/// Execution counters for one client instance.
///
/// A client may back several concurrently running jobs, so the counters
/// are atomics rather than plain fields behind `&mut self`.
#[derive(Debug, Default)]
pub struct ClientStats {
    batches_executed: AtomicU64,
    batches_retried: AtomicU64,
    statements_run: AtomicU64,
    statements_failed: AtomicU64,
}

/// Point-in-time copy of [`ClientStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub batches_executed: u64,
    pub batches_retried: u64,
    pub statements_run: u64,
    pub statements_failed: u64,
}

impl ClientStats {
    pub fn record_batch(&self) {
        self.batches_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.batches_retried.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_statement(&self) {
        self.statements_run.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_statement_failure(&self) {
        self.statements_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            batches_executed: self.batches_executed.load(Ordering::Relaxed),
            batches_retried: self.batches_retried.load(Ordering::Relaxed),
            statements_run: self.statements_run.load(Ordering::Relaxed),
            statements_failed: self.statements_failed.load(Ordering::Relaxed),
        }
    }
}
