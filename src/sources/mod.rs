//! Source loader trait and registry.
//!
//! This module defines the interface for turning an input identifier
//! (file path, URL, or `-` for stdin) into raw source text, along with
//! the registry that picks the right loader for an input.

mod file;
mod stdin;
mod web;

pub use file::FileSource;
pub use stdin::StdinSource;
pub use web::WebSource;

use crate::config::FetchingConfig;
use crate::error::SourceError;
use async_trait::async_trait;
use std::time::Duration;

/// Trait for source text loaders.
///
/// Each loader handles one kind of input identifier and returns the
/// raw text it points at. Loaders do no splitting or markup work.
#[async_trait]
pub trait SourceLoader: Send + Sync {
    /// Returns the human-readable name of this loader.
    fn name(&self) -> &'static str;

    /// Checks if this loader can handle the given input identifier.
    fn can_handle(&self, input: &str) -> bool;

    /// Loads the raw text for the given input identifier.
    async fn load(&self, input: &str) -> Result<String, SourceError>;
}

/// Registry of available source loaders.
pub struct SourceRegistry {
    loaders: Vec<Box<dyn SourceLoader>>,
}

impl SourceRegistry {
    /// Creates a new registry with all available loaders.
    ///
    /// Order matters: the file loader accepts anything that isn't a
    /// URL or `-`, so it goes last.
    pub fn new(config: &FetchingConfig) -> Self {
        let loaders: Vec<Box<dyn SourceLoader>> = vec![
            Box::new(StdinSource::new()),
            Box::new(WebSource::new(config.clone())),
            Box::new(FileSource::new()),
        ];

        Self { loaders }
    }

    /// Finds a loader that can handle the given input identifier.
    pub fn find_for_input(&self, input: &str) -> Option<&dyn SourceLoader> {
        self.loaders
            .iter()
            .find(|l| l.can_handle(input))
            .map(|l| l.as_ref())
    }
}

/// Common HTTP client configuration for web loading.
pub fn create_http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
        .timeout(Duration::from_secs(30))
        .build()
}

/// Applies rate limiting delay.
pub async fn rate_limit(delay_sec: f64) {
    if delay_sec > 0.0 {
        tokio::time::sleep(Duration::from_secs_f64(delay_sec)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_picks_stdin_for_dash() {
        let registry = SourceRegistry::new(&FetchingConfig::default());
        let loader = registry.find_for_input("-").unwrap();
        assert_eq!(loader.name(), "Stdin");
    }

    #[test]
    fn test_registry_picks_web_for_url() {
        let registry = SourceRegistry::new(&FetchingConfig::default());
        let loader = registry.find_for_input("https://example.com/article").unwrap();
        assert_eq!(loader.name(), "Web");
    }

    #[test]
    fn test_registry_falls_back_to_file() {
        let registry = SourceRegistry::new(&FetchingConfig::default());
        let loader = registry.find_for_input("notes/draft.txt").unwrap();
        assert_eq!(loader.name(), "File");
    }
}
