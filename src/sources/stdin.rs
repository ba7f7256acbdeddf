//! Pasted-text source loader (stdin).

use super::SourceLoader;
use crate::error::SourceError;
use async_trait::async_trait;
use std::io::Read;

/// Loads pasted source text from standard input when the input
/// identifier is `-`.
pub struct StdinSource;

impl StdinSource {
    /// Creates a new stdin loader.
    pub fn new() -> Self {
        Self
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceLoader for StdinSource {
    fn name(&self) -> &'static str {
        "Stdin"
    }

    fn can_handle(&self, input: &str) -> bool {
        input == "-"
    }

    async fn load(&self, _input: &str) -> Result<String, SourceError> {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_dash_accepted() {
        let source = StdinSource::new();
        assert!(source.can_handle("-"));
        assert!(!source.can_handle("--"));
        assert!(!source.can_handle("story.txt"));
    }
}
