//! Tag reader trait.

use async_trait::async_trait;
use std::path::Path;

use super::types::TagSet;

/// Reads tags from a local source file.
///
/// Implementations must not fail the job: any problem yields `None` and the
/// encoder runs without tag arguments.
#[async_trait]
pub trait TagReader: Send + Sync {
    /// Returns the name of this reader implementation.
    fn name(&self) -> &str;

    /// Reads tags from `path`. `extension_hint` is the source extension, for
    /// readers that cannot sniff the container.
    async fn read_tags(&self, path: &Path, extension_hint: &str) -> Option<TagSet>;
}

/// Reader used when tag support is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTagReader;

#[async_trait]
impl TagReader for NoTagReader {
    fn name(&self) -> &str {
        "none"
    }

    async fn read_tags(&self, _path: &Path, _extension_hint: &str) -> Option<TagSet> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_tag_reader_is_unavailable() {
        let reader = NoTagReader;
        assert_eq!(reader.name(), "none");
        assert!(reader.read_tags(Path::new("/music/a.mp3"), "mp3").await.is_none());
    }
}
