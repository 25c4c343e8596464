//! The job interface driven by the queue manager.

use async_trait::async_trait;
use reqwest::Url;
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

use super::error::JobError;
use super::types::{JobRequest, JobState};

/// A unit of work the queue manager can schedule.
///
/// `start` and `is_finished` never return errors; failures are recorded on
/// the job and surfaced through [`Job::error`] once `is_finished` is true.
#[async_trait]
pub trait Job: Send {
    /// Unique job id, used in logs.
    fn id(&self) -> Uuid;

    /// The request this job was created from.
    fn request(&self) -> &JobRequest;

    /// Current lifecycle state.
    fn state(&self) -> JobState;

    /// Validates, stages, and launches the job. Never blocks on completion.
    async fn start(&mut self);

    /// Non-blocking completion check. Returns true once terminal.
    fn is_finished(&mut self) -> bool;

    /// Releases handles and deletes the outcome's cleanup set.
    ///
    /// Call once, after `is_finished` returned true.
    fn cleanup(&mut self);

    /// Kills running work and marks the job failed.
    fn abort(&mut self);

    /// The recorded failure, if any.
    fn error(&self) -> Option<&JobError>;

    /// Location of the transcoded file once staged.
    fn output_path(&self) -> Option<&Path>;

    /// Time since `start` was called.
    fn elapsed(&self) -> Option<Duration>;

    /// The failure rendered for reporting.
    fn error_message(&self) -> Option<String> {
        self.error().map(ToString::to_string)
    }

    /// Whether the job finished successfully.
    fn succeeded(&self) -> bool {
        self.state() == JobState::FinishedOk
    }

    /// The output location as a `file://` URL.
    fn output_url(&self) -> Option<String> {
        self.output_path().map(|path| {
            Url::from_file_path(path)
                .map(String::from)
                .unwrap_or_else(|_| format!("file://{}", path.display()))
        })
    }
}

#[async_trait]
impl<J: Job + ?Sized> Job for Box<J> {
    fn id(&self) -> Uuid {
        (**self).id()
    }

    fn request(&self) -> &JobRequest {
        (**self).request()
    }

    fn state(&self) -> JobState {
        (**self).state()
    }

    async fn start(&mut self) {
        (**self).start().await
    }

    fn is_finished(&mut self) -> bool {
        (**self).is_finished()
    }

    fn cleanup(&mut self) {
        (**self).cleanup()
    }

    fn abort(&mut self) {
        (**self).abort()
    }

    fn error(&self) -> Option<&JobError> {
        (**self).error()
    }

    fn output_path(&self) -> Option<&Path> {
        (**self).output_path()
    }

    fn elapsed(&self) -> Option<Duration> {
        (**self).elapsed()
    }
}
