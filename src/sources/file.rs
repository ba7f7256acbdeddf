//! Local file source loader.

use super::SourceLoader;
use crate::error::SourceError;
use async_trait::async_trait;
use url::Url;

/// Loads source text from a UTF-8 file on disk.
pub struct FileSource;

impl FileSource {
    /// Creates a new file loader.
    pub fn new() -> Self {
        Self
    }
}

impl Default for FileSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceLoader for FileSource {
    fn name(&self) -> &'static str {
        "File"
    }

    fn can_handle(&self, input: &str) -> bool {
        // Anything that isn't stdin or a web URL is treated as a path;
        // a missing file surfaces as a read error from load().
        input != "-" && Url::parse(input).map_or(true, |u| !matches!(u.scheme(), "http" | "https"))
    }

    async fn load(&self, input: &str) -> Result<String, SourceError> {
        let text = tokio::fs::read_to_string(input).await?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_can_handle_paths_not_urls() {
        let source = FileSource::new();
        assert!(source.can_handle("story.txt"));
        assert!(source.can_handle("/home/reader/story.txt"));
        assert!(!source.can_handle("https://example.com/story"));
        assert!(!source.can_handle("-"));
    }

    #[tokio::test]
    async fn test_load_reads_file_contents() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "Hello from disk.\n\nSecond paragraph.").unwrap();

        let source = FileSource::new();
        let text = source.load(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(text, "Hello from disk.\n\nSecond paragraph.");
    }

    #[tokio::test]
    async fn test_load_missing_file_errors() {
        let source = FileSource::new();
        let result = source.load("/no/such/file/anywhere.txt").await;
        assert!(matches!(result, Err(SourceError::ReadError(_))));
    }
}
