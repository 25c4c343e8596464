//! Queue status types.

use serde::{Deserialize, Serialize};

/// What a single `poll` pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSummary {
    /// Jobs observed finished and handed to the callback.
    pub completed: usize,
    /// Pending jobs promoted and started.
    pub started: usize,
}

/// Snapshot of the queue for logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStatus {
    /// Number of active jobs.
    pub active_jobs: usize,
    /// Maximum concurrent jobs.
    pub max_concurrency: usize,
    /// Number of jobs waiting to start.
    pub pending_jobs: usize,
    /// Total jobs started since creation.
    pub total_started: u64,
    /// Total jobs that finished successfully.
    pub total_succeeded: u64,
    /// Total jobs that finished with an error, aborts included.
    pub total_failed: u64,
}
