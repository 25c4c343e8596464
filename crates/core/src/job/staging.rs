//! Temp file staging and the two cleanup sets.

use std::fs::File;
use std::io::Seek;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::{Client, Url};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, warn};

use crate::config::StagingConfig;

use super::error::JobError;
use super::types::{JobRequest, SourceRef};

/// Which way a job ended, selecting the cleanup set to delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOutcome {
    Success,
    Error,
}

/// Paths to delete depending on the job outcome.
///
/// A path registered with [`CleanupSets::delete_always`] sits in both sets.
/// Only one set is ever deleted.
#[derive(Debug, Default)]
pub struct CleanupSets {
    on_success: Vec<PathBuf>,
    on_error: Vec<PathBuf>,
}

impl CleanupSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deleted whatever the outcome.
    pub fn delete_always(&mut self, path: PathBuf) {
        self.on_success.push(path.clone());
        self.on_error.push(path);
    }

    /// Deleted only if the job fails.
    pub fn delete_on_error(&mut self, path: PathBuf) {
        self.on_error.push(path);
    }

    /// Deleted only if the job succeeds.
    pub fn delete_on_success(&mut self, path: PathBuf) {
        self.on_success.push(path);
    }

    pub fn on_success(&self) -> &[PathBuf] {
        &self.on_success
    }

    pub fn on_error(&self) -> &[PathBuf] {
        &self.on_error
    }

    pub fn is_empty(&self) -> bool {
        self.on_success.is_empty() && self.on_error.is_empty()
    }

    /// Deletes the set for `outcome` and forgets both sets.
    ///
    /// Returns the number of files removed. Later calls do nothing.
    pub fn remove(&mut self, outcome: CleanupOutcome) -> usize {
        let on_success = std::mem::take(&mut self.on_success);
        let on_error = std::mem::take(&mut self.on_error);
        let doomed = match outcome {
            CleanupOutcome::Success => on_success,
            CleanupOutcome::Error => on_error,
        };

        let mut removed = 0;
        for path in doomed {
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove staged file {}: {}", path.display(), e),
            }
        }
        removed
    }
}

/// Files prepared for one job.
#[derive(Debug)]
pub struct StagedFiles {
    /// Readable source, positioned at the start.
    pub input: File,
    /// Local path of the source, for tag reading.
    pub input_path: PathBuf,
    pub output: File,
    pub output_path: PathBuf,
    /// Shared by both processes for diagnostics.
    pub error_log: File,
    pub error_log_path: PathBuf,
}

/// Creates the input, output, and error log files a job needs.
#[derive(Debug, Clone)]
pub struct FileStaging {
    config: StagingConfig,
    http: Client,
}

impl FileStaging {
    /// Creates a stager with the given configuration.
    pub fn new(config: StagingConfig) -> Result<Self, JobError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .map_err(|e| JobError::staging(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &StagingConfig {
        &self.config
    }

    /// Stages all files for `request`, registering each in `cleanup` as soon
    /// as it exists so a partial failure still gets cleaned up.
    pub async fn stage(
        &self,
        request: &JobRequest,
        cleanup: &mut CleanupSets,
    ) -> Result<StagedFiles, JobError> {
        let source = request.source_ref()?;

        std::fs::create_dir_all(&self.config.temp_dir).map_err(|e| {
            JobError::staging(format!(
                "Failed to create temp directory {}: {}",
                self.config.temp_dir.display(),
                e
            ))
        })?;

        let (input, input_path) = match source {
            SourceRef::Local(path) => {
                let file = File::open(&path).map_err(|e| {
                    JobError::staging(format!("Cannot open {}: {}", path.display(), e))
                })?;
                (file, path)
            }
            SourceRef::Remote(url) => {
                let extension = request.source_extension().unwrap_or_default();
                let (file, path) = self.create_temp(&format!(".{}", extension))?;
                cleanup.delete_always(path.clone());
                let file = self.fetch_remote(&url, file, &path).await?;
                (file, path)
            }
        };

        let (output, output_path) = self.create_temp(&format!(".{}", request.target_format()))?;
        cleanup.delete_on_error(output_path.clone());

        let (error_log, error_log_path) = self.create_temp(".log")?;
        cleanup.delete_on_success(error_log_path.clone());

        debug!(
            "Staged input {}, output {}, log {}",
            input_path.display(),
            output_path.display(),
            error_log_path.display()
        );

        Ok(StagedFiles {
            input,
            input_path,
            output,
            output_path,
            error_log,
            error_log_path,
        })
    }

    fn create_temp(&self, suffix: &str) -> Result<(File, PathBuf), JobError> {
        tempfile::Builder::new()
            .prefix(&self.config.prefix)
            .suffix(suffix)
            .tempfile_in(&self.config.temp_dir)
            .and_then(|temp| temp.keep().map_err(|e| e.error))
            .map_err(|e| {
                JobError::staging(format!(
                    "Failed to create temp file in {}: {}",
                    self.config.temp_dir.display(),
                    e
                ))
            })
    }

    /// Copies a remote source into `file` and rewinds it.
    async fn fetch_remote(&self, url: &Url, file: File, path: &Path) -> Result<File, JobError> {
        let mut response = self
            .http
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| fetch_error(url, e))?;

        let mut writer = BufWriter::with_capacity(
            self.config.chunk_size,
            tokio::fs::File::from_std(file),
        );
        let mut total_bytes = 0u64;

        while let Some(chunk) = response.chunk().await.map_err(|e| fetch_error(url, e))? {
            writer.write_all(&chunk).await.map_err(|e| fetch_error(url, e))?;
            total_bytes += chunk.len() as u64;
        }
        writer.flush().await.map_err(|e| fetch_error(url, e))?;

        let mut file = writer.into_inner().into_std().await;
        file.rewind().map_err(|e| fetch_error(url, e))?;

        debug!("Fetched {} bytes from {} into {}", total_bytes, url, path.display());
        Ok(file)
    }
}

fn fetch_error(url: &Url, e: impl std::fmt::Display) -> JobError {
    JobError::staging(format!("Failed to fetch {}: {}", url, e))
}
