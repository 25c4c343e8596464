//! FFprobe-based tag reader.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::reader::TagReader;
use super::types::{TagField, TagSet};

/// Reads container tags by running `ffprobe` on the staged source file.
#[derive(Debug, Clone)]
pub struct FfprobeTagReader {
    ffprobe_path: PathBuf,
}

impl FfprobeTagReader {
    /// Creates a reader using the given ffprobe binary.
    pub fn new(ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Creates a reader using `ffprobe` from the search path.
    pub fn with_defaults() -> Self {
        Self::new("ffprobe")
    }

    /// Parses ffprobe `-show_format` JSON output into a tag set.
    fn parse_probe_output(output: &str) -> Option<TagSet> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            #[serde(default)]
            tags: HashMap<String, String>,
        }

        let probe: ProbeOutput = serde_json::from_str(output)
            .map_err(|e| debug!("Failed to parse ffprobe output: {}", e))
            .ok()?;

        let mut tags = TagSet::new();
        for (key, value) in &probe.format.tags {
            match key.to_lowercase().as_str() {
                "date" | "year" => {
                    if let Some(year) = leading_number(value) {
                        tags.insert(TagField::Year, year);
                    }
                }
                "track" => {
                    // "3/12" means track 3 of 12
                    if let Some(track) = leading_number(value) {
                        tags.insert(TagField::Track, track);
                    }
                }
                other => {
                    if let Ok(field) = other.parse::<TagField>() {
                        if !field.is_numeric() {
                            tags.insert(field, value.as_str());
                        }
                    }
                }
            }
        }

        Some(tags)
    }
}

fn leading_number(value: &str) -> Option<u32> {
    let digits: String = value
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[async_trait]
impl TagReader for FfprobeTagReader {
    fn name(&self) -> &str {
        "ffprobe"
    }

    async fn read_tags(&self, path: &Path, extension_hint: &str) -> Option<TagSet> {
        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await;

        let output = match output {
            Ok(o) if o.status.success() => o,
            Ok(o) => {
                debug!(
                    "ffprobe exited with {} for {} ({})",
                    o.status,
                    path.display(),
                    extension_hint
                );
                return None;
            }
            Err(e) => {
                debug!("ffprobe unavailable at {:?}: {}", self.ffprobe_path, e);
                return None;
            }
        };

        Self::parse_probe_output(&String::from_utf8_lossy(&output.stdout))
    }
}
