//! Decoder-to-encoder process chain for a single track.

use async_trait::async_trait;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::tags::TagInjector;

use super::context::JobContext;
use super::error::JobError;
use super::staging::{CleanupOutcome, CleanupSets};
use super::traits::Job;
use super::types::{JobRequest, JobState};

/// Most of the error log carried in a failure message. The full log stays on
/// disk at the path named in the message.
const ERROR_LOG_TAIL_BYTES: u64 = 4096;

/// Transcodes one track by piping a decoder into an encoder.
///
/// The decoder reads the staged input and writes raw audio into an OS pipe;
/// the encoder reads the pipe and writes the staged output. Both share one
/// error log for diagnostics.
pub struct TranscodeJob {
    id: Uuid,
    request: JobRequest,
    context: Arc<JobContext>,
    state: JobState,
    error: Option<JobError>,
    output_path: Option<PathBuf>,
    error_log_path: Option<PathBuf>,
    decoder: Option<Child>,
    encoder: Option<Child>,
    encoder_status: Option<ExitStatus>,
    cleanup: CleanupSets,
    cleaned_up: bool,
    started_at: Option<Instant>,
    finished_at: Option<Instant>,
}

impl TranscodeJob {
    /// Creates a job in the `Created` state.
    pub fn new(request: JobRequest, context: Arc<JobContext>) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            context,
            state: JobState::Created,
            error: None,
            output_path: None,
            error_log_path: None,
            decoder: None,
            encoder: None,
            encoder_status: None,
            cleanup: CleanupSets::new(),
            cleaned_up: false,
            started_at: None,
            finished_at: None,
        }
    }

    /// Location of the shared decoder/encoder error log once staged.
    pub fn error_log_path(&self) -> Option<&Path> {
        self.error_log_path.as_deref()
    }

    async fn launch(&mut self) -> Result<(), JobError> {
        let codecs = self.context.resolve_codecs(&self.request)?;

        let staged = self
            .context
            .staging()
            .stage(&self.request, &mut self.cleanup)
            .await?;
        self.output_path = Some(staged.output_path.clone());
        self.error_log_path = Some(staged.error_log_path.clone());

        let encoder_args = if codecs.encoder.supports_tags() {
            let tags = self
                .context
                .tag_reader()
                .read_tags(&staged.input_path, &codecs.extension)
                .await;
            if tags.is_none() {
                debug!("Job {}: no tags read from {}", self.id, staged.input_path.display());
            }
            TagInjector::new(&codecs.encoder.tags)
                .inject(&codecs.encoder.command.args, tags.as_ref())
        } else {
            codecs.encoder.command.args.clone()
        };

        let (pipe_reader, pipe_writer) =
            std::io::pipe().map_err(|e| JobError::spawn("pipe", e))?;

        let decoder = spawn_stage(
            &codecs.decoder.args,
            Stdio::from(staged.input),
            Stdio::from(pipe_writer),
            &staged.error_log,
        )?;
        self.decoder = Some(decoder);

        let encoder = spawn_stage(
            &encoder_args,
            Stdio::from(pipe_reader),
            Stdio::from(staged.output),
            &staged.error_log,
        );
        match encoder {
            Ok(encoder) => self.encoder = Some(encoder),
            Err(e) => {
                self.kill_decoder();
                return Err(e);
            }
        }

        debug!(
            "Job {}: decoder {:?}, encoder {:?}",
            self.id, codecs.decoder.args, encoder_args
        );
        Ok(())
    }

    /// Returns true once both processes are done and the outcome is known.
    fn poll_pipeline(&mut self) -> Result<bool, JobError> {
        if self.encoder_status.is_none() {
            let Some(encoder) = self.encoder.as_mut() else {
                return Ok(true);
            };
            let Some(status) = encoder.try_wait().map_err(JobError::Status)? else {
                return Ok(false);
            };
            self.encoder_status = Some(status);

            if !status.success() {
                self.kill_decoder();
                return Err(JobError::Transcode {
                    status: status.to_string(),
                    log_path: self.error_log_path.clone().unwrap_or_default(),
                    log: self.read_error_log(),
                });
            }
        }

        if !self.context.check_decoder_status() {
            return Ok(true);
        }

        let Some(decoder) = self.decoder.as_mut() else {
            return Ok(true);
        };
        match decoder.try_wait().map_err(JobError::Status)? {
            None => Ok(false),
            Some(status) if status.success() => Ok(true),
            Some(status) => Err(JobError::Decode {
                status: status.to_string(),
                log_path: self.error_log_path.clone().unwrap_or_default(),
                log: self.read_error_log(),
            }),
        }
    }

    fn kill_decoder(&mut self) {
        if let Some(decoder) = self.decoder.as_mut() {
            if let Err(e) = decoder.start_kill() {
                debug!("Job {}: decoder already gone: {}", self.id, e);
            }
        }
    }

    fn read_error_log(&self) -> String {
        let Some(path) = self.error_log_path.as_deref() else {
            return String::new();
        };
        read_tail(path, ERROR_LOG_TAIL_BYTES).unwrap_or_else(|e| {
            debug!("Job {}: cannot read {}: {}", self.id, path.display(), e);
            String::new()
        })
    }

    fn finish(&mut self, state: JobState) {
        self.state = state;
        self.finished_at = Some(Instant::now());
    }

    fn fail(&mut self, error: JobError) {
        warn!(
            "Job {} failed ({} -> {}): {}",
            self.id,
            self.request.source(),
            self.request.target_format(),
            error
        );
        self.error = Some(error);
        self.finish(JobState::FinishedError);
    }
}

#[async_trait]
impl Job for TranscodeJob {
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
            warn!("Job {} already started, ignoring start", self.id);
            return;
        }

        self.started_at = Some(Instant::now());
        info!(
            "Starting job {}: {} -> {}",
            self.id,
            self.request.source(),
            self.request.target_format()
        );

        match self.launch().await {
            Ok(()) => self.state = JobState::Running,
            Err(e) => self.fail(e),
        }
    }

    fn is_finished(&mut self) -> bool {
        match self.state {
            JobState::FinishedOk | JobState::FinishedError => true,
            JobState::Created => false,
            JobState::Running => match self.poll_pipeline() {
                Ok(false) => false,
                Ok(true) => {
                    self.finish(JobState::FinishedOk);
                    info!(
                        "Job {} finished in {:?}: {}",
                        self.id,
                        self.elapsed().unwrap_or_default(),
                        self.output_path
                            .as_deref()
                            .map(|p| p.display().to_string())
                            .unwrap_or_default()
                    );
                    true
                }
                Err(e) => {
                    self.fail(e);
                    true
                }
            },
        }
    }

    fn cleanup(&mut self) {
        if self.cleaned_up {
            return;
        }
        self.cleaned_up = true;

        // Dropping the handles kills anything still running.
        self.decoder = None;
        self.encoder = None;

        let outcome = if self.state == JobState::FinishedOk {
            CleanupOutcome::Success
        } else {
            CleanupOutcome::Error
        };
        let removed = self.cleanup.remove(outcome);
        debug!("Job {}: removed {} staged file(s)", self.id, removed);
    }

    fn abort(&mut self) {
        // Children that already exited keep their real outcome
        if self.is_finished() {
            return;
        }

        for child in [self.decoder.as_mut(), self.encoder.as_mut()]
            .into_iter()
            .flatten()
        {
            if let Err(e) = child.start_kill() {
                debug!("Job {}: process already gone: {}", self.id, e);
            }
        }
        self.fail(JobError::Aborted);
    }

    fn error(&self) -> Option<&JobError> {
        self.error.as_ref()
    }

    fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    fn elapsed(&self) -> Option<Duration> {
        let started = self.started_at?;
        Some(
            self.finished_at
                .map(|finished| finished.duration_since(started))
                .unwrap_or_else(|| started.elapsed()),
        )
    }
}

/// Reads at most the last `limit` bytes of a text file, trimmed.
fn read_tail(path: &Path, limit: u64) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let skipped = file.metadata()?.len().saturating_sub(limit);
    file.seek(SeekFrom::Start(skipped))?;

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    let text = String::from_utf8_lossy(&bytes);

    if skipped > 0 {
        Ok(format!("[{} earlier bytes omitted] {}", skipped, text.trim()))
    } else {
        Ok(text.trim().to_string())
    }
}

/// Spawns one side of the chain with stderr appended to the shared log.
///
/// The `Command` (and with it the parent's copies of the pipe ends) is
/// dropped before returning, so end-of-stream propagates between children.
fn spawn_stage(
    args: &[String],
    stdin: Stdio,
    stdout: Stdio,
    error_log: &File,
) -> Result<Child, JobError> {
    let (program, rest) = args.split_first().ok_or_else(|| {
        JobError::spawn(
            "",
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
        )
    })?;
    let stderr = error_log
        .try_clone()
        .map_err(|e| JobError::spawn(program.as_str(), e))?;

    Command::new(program)
        .args(rest)
        .stdin(stdin)
        .stdout(stdout)
        .stderr(stderr)
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| JobError::spawn(program.as_str(), e))
}
