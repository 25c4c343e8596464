//! FIFO admission of jobs with bounded concurrency.

mod manager;
mod types;

pub use manager::{CompletionCallback, QueueManager};
pub use types::{PollSummary, QueueStatus};
