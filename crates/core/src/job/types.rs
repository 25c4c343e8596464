//! Job request and state types.

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::error::JobError;

/// Lifecycle of a job. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Created,
    Running,
    FinishedOk,
    FinishedError,
}

impl JobState {
    /// Whether the job has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::FinishedOk | Self::FinishedError)
    }
}

/// Where the source track lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    /// A file on this machine, opened in place.
    Local(PathBuf),
    /// A remote resource, copied into an owned temp file.
    Remote(Url),
}

impl SourceRef {
    /// Parses a `file://` URL, an `http(s)://` URL, or a plain path.
    pub fn parse(reference: &str) -> Result<Self, JobError> {
        let url = match Url::parse(reference) {
            Ok(url) => url,
            Err(_) => return Ok(Self::Local(PathBuf::from(reference))),
        };

        match url.scheme() {
            "file" => url
                .to_file_path()
                .map(Self::Local)
                .map_err(|_| JobError::staging(format!("Invalid file URL: {}", reference))),
            "http" | "https" => Ok(Self::Remote(url)),
            // Windows drive letters parse as one-letter schemes
            scheme if scheme.len() == 1 => Ok(Self::Local(PathBuf::from(reference))),
            scheme => Err(JobError::staging(format!(
                "Unsupported source scheme '{}': {}",
                scheme, reference
            ))),
        }
    }
}

/// A request to transcode one track. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    source: String,
    target_format: String,
    submitted_at: DateTime<Utc>,
}

impl JobRequest {
    /// Creates a request. The target format is lowercased.
    pub fn new(source: impl Into<String>, target_format: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target_format: target_format.into().to_lowercase(),
            submitted_at: Utc::now(),
        }
    }

    /// The source reference as submitted.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Lowercased target format identifier.
    pub fn target_format(&self) -> &str {
        &self.target_format
    }

    /// When the request was created.
    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// Lowercased extension after the final `.` of the source path.
    pub fn source_extension(&self) -> Option<String> {
        let path = match Url::parse(&self.source) {
            Ok(url) if url.scheme().len() > 1 => url.path().to_string(),
            _ => self.source.clone(),
        };

        let file_name = path.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(&path);
        file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .filter(|ext| !ext.is_empty())
    }

    /// Parses the source reference.
    pub fn source_ref(&self) -> Result<SourceRef, JobError> {
        SourceRef::parse(&self.source)
    }
}
