//! Translation via OpenAI-compatible APIs.
//!
//! Provides section and title translation with prompt templating,
//! refusal detection, and retry logic. Calls are non-streaming so
//! that several sections can be in flight at once.

use crate::config::{ApiConfig, PromptsConfig, TranslationConfig};
use crate::error::TranslationError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;

/// Refusal phrases that indicate the model declined to translate.
static REFUSAL_PHRASES: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    vec![
        "i'm sorry",
        "i cannot",
        "i am unable",
        "as an ai",
        "my apologies",
        "i am not programmed",
        "i do not have the ability",
    ]
});

/// The language pair a bilingual edition translates between.
#[derive(Debug, Clone)]
pub struct LanguagePair {
    /// Language of the source text (e.g. "Chinese").
    pub source: String,
    /// Language of the translation (e.g. "Vietnamese").
    pub target: String,
}

/// A message in the chat completion request.
#[derive(Debug, Clone, Serialize)]
struct Message {
    role: String,
    content: String,
}

/// Request body for the chat completions API.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
}

/// Response from the chat completions API.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

/// A single choice in the response.
#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

/// Message content in a response.
#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Fills the `{source}`/`{target}` placeholders of a prompt template.
pub fn render_prompt(template: &str, languages: &LanguagePair) -> String {
    template
        .replace("{source}", &languages.source)
        .replace("{target}", &languages.target)
}

/// Translator for converting source text between a language pair.
pub struct Translator {
    /// HTTP client for API requests.
    client: Client,
    /// API configuration.
    api_config: ApiConfig,
    /// Translation behavior configuration.
    translation_config: TranslationConfig,
    /// System prompt for section content translation.
    content_prompt: String,
    /// System prompt for title translation.
    title_prompt: String,
}

impl Translator {
    /// Create a new Translator for the given language pair.
    pub fn new(
        api_config: ApiConfig,
        translation_config: TranslationConfig,
        prompts: &PromptsConfig,
        languages: &LanguagePair,
    ) -> Self {
        Self {
            client: Client::new(),
            api_config,
            translation_config,
            content_prompt: render_prompt(&prompts.content_translation, languages),
            title_prompt: render_prompt(&prompts.title_translation, languages),
        }
    }

    /// Translate one section of content.
    ///
    /// Retries with exponential backoff up to the configured attempt
    /// count; the caller decides what a final failure means for the book.
    pub async fn translate_section(&self, text: &str) -> Result<String, TranslationError> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        self.translate_with_retries(&self.content_prompt, text).await
    }

    /// Translate a book or chapter title.
    pub async fn translate_title(&self, title: &str) -> Result<String, TranslationError> {
        if title.trim().is_empty() {
            return Ok(String::new());
        }

        self.translate_with_retries(&self.title_prompt, title).await
    }

    /// Retry loop shared by section and title translation.
    async fn translate_with_retries(
        &self,
        system_prompt: &str,
        text: &str,
    ) -> Result<String, TranslationError> {
        let retries = self.translation_config.retries.max(1);
        let mut attempt = 0;

        loop {
            match self.call_model(system_prompt, text).await {
                Ok(translated) => return Ok(translated),
                Err(e) => {
                    attempt += 1;
                    if attempt >= retries {
                        return Err(e);
                    }
                    // Exponential backoff
                    tokio::time::sleep(Duration::from_secs(2u64.pow(attempt))).await;
                }
            }
        }
    }

    /// Make a single chat completion call and validate the result.
    async fn call_model(
        &self,
        system_prompt: &str,
        text: &str,
    ) -> Result<String, TranslationError> {
        let request = ChatRequest {
            model: self.api_config.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
        };

        let url = format!("{}/chat/completions", self.api_config.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_config.key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(TranslationError::ApiError(format!(
                "HTTP {}: {}",
                status, text
            )));
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            TranslationError::ParseError(format!("Failed to parse API response: {}", e))
        })?;

        let Some(choice) = body.choices.first() else {
            return Err(TranslationError::ParseError(
                "No choices in API response".to_string(),
            ));
        };

        let trimmed = choice.message.content.trim().to_string();

        if trimmed.is_empty() {
            return Err(TranslationError::Refused("Empty response".to_string()));
        }

        // Check for refusal phrases
        let lower = trimmed.to_lowercase();
        for phrase in REFUSAL_PHRASES.iter() {
            if lower.starts_with(phrase) {
                return Err(TranslationError::Refused(format!(
                    "Response starts with refusal phrase: {}",
                    phrase
                )));
            }
        }

        // Delay before the next request from this task
        if self.translation_config.delay_between_requests_sec > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(
                self.translation_config.delay_between_requests_sec,
            ))
            .await;
        }

        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn languages() -> LanguagePair {
        LanguagePair {
            source: "Chinese".to_string(),
            target: "Vietnamese".to_string(),
        }
    }

    #[test]
    fn test_render_prompt_substitutes_languages() {
        let rendered = render_prompt("Translate {source} into {target}.", &languages());
        assert_eq!(rendered, "Translate Chinese into Vietnamese.");
    }

    #[test]
    fn test_render_prompt_without_placeholders() {
        let rendered = render_prompt("Translate this.", &languages());
        assert_eq!(rendered, "Translate this.");
    }

    #[test]
    fn test_refusal_detection() {
        let phrases = vec![
            "I'm sorry, but I cannot",
            "As an AI, I must decline",
            "I cannot assist with that",
        ];

        for phrase in phrases {
            let lower = phrase.to_lowercase();
            let is_refusal = REFUSAL_PHRASES.iter().any(|p| lower.starts_with(p));
            assert!(is_refusal, "Should detect refusal: {}", phrase);
        }
    }

    #[test]
    fn test_non_refusal() {
        let phrases = vec![
            "The translation is...",
            "Here is the translated text",
            "Xin chào thế giới.",
        ];

        for phrase in phrases {
            let lower = phrase.to_lowercase();
            let is_refusal = REFUSAL_PHRASES.iter().any(|p| lower.starts_with(p));
            assert!(!is_refusal, "Should not detect refusal: {}", phrase);
        }
    }

    #[tokio::test]
    async fn test_empty_section_translates_to_empty() {
        let translator = Translator::new(
            ApiConfig::default(),
            TranslationConfig::default(),
            &PromptsConfig::default(),
            &languages(),
        );

        // No API call is made for blank input
        let result = translator.translate_section("   \n ").await.unwrap();
        assert_eq!(result, "");
    }
}
