use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::codec::{CodecCommand, EncoderEntry};

/// Root configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub staging: StagingConfig,
    #[serde(default)]
    pub tags: TagsConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub codecs: CodecsConfig,
}

/// Queue manager configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Jobs allowed to run at once (default: processor count)
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Delay between polls while jobs are outstanding
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_max_concurrency() -> usize {
    num_cpus::get().max(1)
}

fn default_poll_interval_ms() -> u64 {
    100
}

/// Temp file configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StagingConfig {
    /// Directory for fetched inputs, outputs, and error logs
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    /// File name prefix for every staged file
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Write buffer size for remote fetches, in bytes
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Overall timeout for a remote fetch. The queue waits on the fetch,
    /// so this also bounds how long new input and signals go unanswered.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            prefix: default_prefix(),
            chunk_size: default_chunk_size(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_prefix() -> String {
    "transcode-".to_string()
}

fn default_chunk_size() -> usize {
    16 * 1024
}

fn default_fetch_timeout_secs() -> u64 {
    60
}

/// Where source tags come from
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TagBackend {
    #[default]
    Ffprobe,
    None,
}

/// Tag reading configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TagsConfig {
    #[serde(default)]
    pub backend: TagBackend,
    /// Path to ffprobe binary (default: "ffprobe")
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,
}

impl Default for TagsConfig {
    fn default() -> Self {
        Self {
            backend: TagBackend::default(),
            ffprobe_path: default_ffprobe_path(),
        }
    }
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

/// Process chain configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Fail the job when the decoder exits nonzero
    #[serde(default = "default_true")]
    pub check_decoder_status: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            check_decoder_status: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Completion notification configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NotifyConfig {
    /// Command run as `<command...> <source> <url-or-"">`.
    /// Unset means completion lines go to stdout.
    #[serde(default)]
    pub command: Option<Vec<String>>,
}

/// User overrides for the built-in codec tables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CodecsConfig {
    /// Decoders keyed by source extension
    #[serde(default)]
    pub decoders: HashMap<String, CodecCommand>,
    /// Encoders keyed by target format
    #[serde(default)]
    pub encoders: HashMap<String, EncoderEntry>,
}
