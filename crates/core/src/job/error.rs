//! Error types for transcode jobs.

use std::path::PathBuf;
use thiserror::Error;

use crate::codec::CodecError;

/// Reasons a job ends in `FinishedError`.
///
/// All are fatal to the individual job only. None are retried.
#[derive(Debug, Error)]
pub enum JobError {
    /// No codec entry, or its tool is not installed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Could not open, fetch, or allocate a staged file.
    #[error("Staging failed: {reason}")]
    Staging { reason: String },

    /// Process creation failed.
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Encoder exited nonzero.
    #[error("Unable to transcode ({status}), please review {}: {log}", log_path.display())]
    Transcode {
        status: String,
        log_path: PathBuf,
        log: String,
    },

    /// Decoder exited nonzero while the encoder succeeded.
    #[error("Unable to decode source ({status}), please review {}: {log}", log_path.display())]
    Decode {
        status: String,
        log_path: PathBuf,
        log: String,
    },

    /// Could not query a child process.
    #[error("Failed to query process status: {0}")]
    Status(#[source] std::io::Error),

    /// Stopped before completion.
    #[error("Job aborted before completion")]
    Aborted,
}

impl JobError {
    /// Creates a staging error.
    pub fn staging(reason: impl Into<String>) -> Self {
        Self::Staging {
            reason: reason.into(),
        }
    }

    /// Creates a spawn error.
    pub fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }

    /// Whether the failure happened before any process ran.
    pub fn is_pre_launch(&self) -> bool {
        matches!(self, Self::Codec(_) | Self::Staging { .. } | Self::Spawn { .. })
    }
}
