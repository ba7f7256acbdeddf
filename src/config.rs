//! Configuration management for Seihon.
//!
//! Handles loading, saving, and validating configuration from
//! platform-specific config directories.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application name used for config directory.
const APP_NAME: &str = "Seihon";

/// Default config filename.
const CONFIG_FILENAME: &str = "config.toml";

/// Placeholder value for unconfigured API keys.
const API_KEY_PLACEHOLDER: &str = "YOUR_API_KEY_HERE";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Translation API configuration.
    pub api: ApiConfig,

    /// Translation behavior settings.
    pub translation: TranslationConfig,

    /// Glossary scout settings.
    pub glossary: GlossaryConfig,

    /// Web fetching settings.
    pub fetching: FetchingConfig,

    /// LLM prompts.
    pub prompts: PromptsConfig,

    /// File paths.
    pub paths: PathsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            translation: TranslationConfig::default(),
            glossary: GlossaryConfig::default(),
            fetching: FetchingConfig::default(),
            prompts: PromptsConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

/// API configuration for LLM endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API key (required).
    pub key: String,

    /// Base URL for the API.
    pub base_url: String,

    /// Model identifier.
    pub model: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: API_KEY_PLACEHOLDER.to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }
}

impl ApiConfig {
    /// Checks if the API key is configured (not placeholder).
    pub fn is_configured(&self) -> bool {
        !self.key.is_empty() && self.key != API_KEY_PLACEHOLDER
    }
}

/// Translation behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Number of retry attempts for failed translations.
    pub retries: u32,

    /// Delay between API requests in seconds.
    pub delay_between_requests_sec: f64,

    /// Deadline for one section's translation in seconds.
    /// A section that misses it is kept untranslated.
    pub timeout_per_section_sec: u64,

    /// How many sections to split the source into when the user
    /// doesn't ask for a specific count.
    pub default_sections: usize,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            delay_between_requests_sec: 1.0,
            timeout_per_section_sec: 120,
            default_sections: 4,
        }
    }
}

/// Glossary scout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlossaryConfig {
    /// Maximum characters per glossary scout chunk.
    pub chunk_size_chars: usize,

    /// Number of retry attempts.
    pub retries: u32,

    /// Number of JSON parsing retry attempts.
    pub json_retries: u32,

    /// Delay between requests in seconds.
    pub delay_between_requests_sec: f64,

    /// Maximum number of glossary entries to keep per book.
    pub max_terms: usize,
}

impl Default for GlossaryConfig {
    fn default() -> Self {
        Self {
            chunk_size_chars: 2500,
            retries: 3,
            json_retries: 3,
            delay_between_requests_sec: 1.0,
            max_terms: 15,
        }
    }
}

/// Web fetching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchingConfig {
    /// Delay between web requests in seconds.
    pub delay_between_requests_sec: f64,
}

impl Default for FetchingConfig {
    fn default() -> Self {
        Self {
            delay_between_requests_sec: 1.0,
        }
    }
}

/// LLM system prompts.
///
/// Translation prompts are templates: `{source}` and `{target}` are
/// replaced with the book's language names before the call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Prompt for title translation.
    pub title_translation: String,

    /// Prompt for section content translation.
    pub content_translation: String,

    /// Prompt for glossary term extraction.
    pub glossary_scout: String,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            title_translation: "You are a {source} to {target} translator. Translate the following book title to {target}. Provide only the translated title, nothing else.".to_string(),
            content_translation: "You are a {source} to {target} translator. Translate the following text to natural {target}, preserving the author's style, tone, and paragraph breaks. Keep every paragraph separated by a blank line exactly as in the input. Provide only the translation, nothing else.".to_string(),
            glossary_scout: r#"You read {source} text and pick out difficult or culturally notable terms a {target} reader would want explained.
Return ONLY JSON with this shape:
{"terms":[{"term":"<exact term as written>","translation":"<{target} rendering>","explanation":"<one or two sentences in {target}>"}]}
Pick at most 15 terms for the whole text. No explanations outside the JSON."#.to_string(),
        }
    }
}

/// File path configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory where finished EPUB files are written.
    pub output_directory: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Returns the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Returns the full path to the config file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(CONFIG_FILENAME))
    }

    /// Loads configuration from the default location.
    ///
    /// If the config file doesn't exist, creates a default one.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            // Create default config
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates the configuration.
    ///
    /// The API key is only required when the run actually calls the
    /// model (bilingual or glossary mode).
    pub fn validate(&self, needs_api: bool) -> Result<(), ConfigError> {
        if needs_api && !self.api.is_configured() {
            return Err(ConfigError::MissingValue(
                "api.key (set your API key in config file)".to_string(),
            ));
        }

        if self.translation.default_sections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "translation.default_sections".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        if self.translation.timeout_per_section_sec == 0 {
            return Err(ConfigError::InvalidValue {
                key: "translation.timeout_per_section_sec".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        if self.glossary.chunk_size_chars == 0 {
            return Err(ConfigError::InvalidValue {
                key: "glossary.chunk_size_chars".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        if self.glossary.max_terms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "glossary.max_terms".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.api.is_configured());
        assert_eq!(config.translation.default_sections, 4);
        assert_eq!(config.glossary.max_terms, 15);
        assert_eq!(config.fetching.delay_between_requests_sec, 1.0);
    }

    #[test]
    fn test_api_configured_check() {
        let mut api = ApiConfig::default();
        assert!(!api.is_configured());

        api.key = "sk-real-key".to_string();
        assert!(api.is_configured());
    }

    #[test]
    fn test_config_round_trip() {
        let config = Config::default();
        let file = NamedTempFile::new().unwrap();

        config.save_to(file.path()).unwrap();

        let loaded = Config::load_from(file.path()).unwrap();
        assert_eq!(loaded.api.model, config.api.model);
        assert_eq!(
            loaded.translation.timeout_per_section_sec,
            config.translation.timeout_per_section_sec
        );
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate(true).is_err()); // API key not set
        assert!(config.validate(false).is_ok()); // monolingual run needs none

        let mut config = Config::default();
        config.api.key = "real-key".to_string();
        assert!(config.validate(true).is_ok());
    }

    #[test]
    fn test_invalid_sections_rejected() {
        let mut config = Config::default();
        config.translation.default_sections = 0;
        assert!(config.validate(false).is_err());
    }

    #[test]
    fn test_prompt_templates_have_placeholders() {
        let prompts = PromptsConfig::default();
        assert!(prompts.content_translation.contains("{source}"));
        assert!(prompts.content_translation.contains("{target}"));
        assert!(prompts.glossary_scout.contains("{target}"));
    }
}
