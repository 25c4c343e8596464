//! Transcode jobs: request types, staging, and the process chain.

mod context;
mod error;
mod staging;
mod traits;
mod transcode;
mod types;

pub use context::{JobContext, ResolvedCodecs};
pub use error::JobError;
pub use staging::{CleanupOutcome, CleanupSets, FileStaging, StagedFiles};
pub use traits::Job;
pub use transcode::TranscodeJob;
pub use types::{JobRequest, JobState, SourceRef};
