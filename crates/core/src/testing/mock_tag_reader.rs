//! Mock tag reader for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::tags::{TagReader, TagSet};

/// Tag reader returning a preset [`TagSet`] and recording every call.
#[derive(Debug, Clone, Default)]
pub struct MockTagReader {
    tags: Arc<RwLock<Option<TagSet>>>,
    calls: Arc<RwLock<Vec<(PathBuf, String)>>>,
}

impl MockTagReader {
    /// Create a reader that reports no tags.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a reader that reports `tags` for every file.
    pub fn with_tags(tags: TagSet) -> Self {
        Self {
            tags: Arc::new(RwLock::new(Some(tags))),
            calls: Arc::default(),
        }
    }

    /// Replace the reported tags.
    pub async fn set_tags(&self, tags: Option<TagSet>) {
        *self.tags.write().await = tags;
    }

    /// Paths and extension hints passed to `read_tags`.
    pub async fn recorded_calls(&self) -> Vec<(PathBuf, String)> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl TagReader for MockTagReader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn read_tags(&self, path: &Path, extension_hint: &str) -> Option<TagSet> {
        self.calls
            .write()
            .await
            .push((path.to_path_buf(), extension_hint.to_string()));
        self.tags.read().await.clone()
    }
}
