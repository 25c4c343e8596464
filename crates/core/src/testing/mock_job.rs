//! Mock job for queue tests.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::job::{Job, JobError, JobRequest, JobState};

#[derive(Debug, Default)]
struct Shared {
    started: bool,
    fail_on_start: bool,
    outcome: Option<Result<(), String>>,
    cleanup_count: usize,
    aborted: bool,
}

/// Handle for steering a [`MockJob`] after it was moved into a queue.
#[derive(Debug, Clone, Default)]
pub struct MockJobControl {
    shared: Arc<Mutex<Shared>>,
}

impl MockJobControl {
    fn with<T>(&self, f: impl FnOnce(&mut Shared) -> T) -> T {
        let mut shared = self.shared.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut shared)
    }

    /// Simulate the encoder exiting 0.
    pub fn finish_ok(&self) {
        self.with(|s| s.outcome = Some(Ok(())));
    }

    /// Simulate the encoder exiting nonzero with `log` in the error log.
    pub fn finish_with_error(&self, log: impl Into<String>) {
        let log = log.into();
        self.with(|s| s.outcome = Some(Err(log)));
    }

    /// Make `start` fail before anything runs.
    pub fn fail_on_start(&self) {
        self.with(|s| s.fail_on_start = true);
    }

    pub fn is_started(&self) -> bool {
        self.with(|s| s.started)
    }

    pub fn cleanup_count(&self) -> usize {
        self.with(|s| s.cleanup_count)
    }

    pub fn was_aborted(&self) -> bool {
        self.with(|s| s.aborted)
    }
}

/// Job whose completion is decided by a [`MockJobControl`].
#[derive(Debug)]
pub struct MockJob {
    id: Uuid,
    request: JobRequest,
    state: JobState,
    error: Option<JobError>,
    output_path: Option<PathBuf>,
    started_at: Option<Instant>,
    control: MockJobControl,
}

impl MockJob {
    /// Creates a job and the control that drives it.
    pub fn new(source: &str, target_format: &str) -> (Self, MockJobControl) {
        let control = MockJobControl::default();
        let job = Self {
            id: Uuid::new_v4(),
            request: JobRequest::new(source, target_format),
            state: JobState::Created,
            error: None,
            output_path: None,
            started_at: None,
            control: control.clone(),
        };
        (job, control)
    }

    /// Sets the path reported by `output_path`.
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    fn fail(&mut self, error: JobError) {
        self.error = Some(error);
        self.state = JobState::FinishedError;
    }
}

#[async_trait]
impl Job for MockJob {
    fn id(&self) -> Uuid {
        self.id
    }

    fn request(&self) -> &JobRequest {
        &self.request
    }

    fn state(&self) -> JobState {
        self.state
    }

    async fn start(&mut self) {
        if self.state != JobState::Created {
            return;
        }
        self.started_at = Some(Instant::now());

        let fail = self.control.with(|s| {
            s.started = true;
            s.fail_on_start
        });
        if fail {
            self.fail(JobError::staging("mock start failure"));
        } else {
            self.state = JobState::Running;
        }
    }

    fn is_finished(&mut self) -> bool {
        if self.state.is_terminal() {
            return true;
        }
        if self.state != JobState::Running {
            return false;
        }

        match self.control.with(|s| s.outcome.clone()) {
            None => false,
            Some(Ok(())) => {
                self.state = JobState::FinishedOk;
                true
            }
            Some(Err(log)) => {
                self.fail(JobError::Transcode {
                    status: "exit status: 1".to_string(),
                    log_path: PathBuf::new(),
                    log,
                });
                true
            }
        }
    }

    fn cleanup(&mut self) {
        self.control.with(|s| s.cleanup_count += 1);
    }

    fn abort(&mut self) {
        if self.is_finished() {
            return;
        }
        self.control.with(|s| s.aborted = true);
        self.fail(JobError::Aborted);
    }

    fn error(&self) -> Option<&JobError> {
        self.error.as_ref()
    }

    fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    fn elapsed(&self) -> Option<Duration> {
        self.started_at.map(|t| t.elapsed())
    }
}
