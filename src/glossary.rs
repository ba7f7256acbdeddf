//! Glossary Scout - Select notable terms from source text using LLM.
//!
//! Uses a secondary LLM pass to pick out difficult or culturally
//! notable terms and attach a translation and explanation to each.
//! The whole pass is best-effort: a run with zero entries is valid.

use crate::config::{ApiConfig, GlossaryConfig};
use crate::console::Console;
use crate::error::TranslationError;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;

/// Regex to extract JSON from markdown code fences.
static CODE_FENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```[a-zA-Z]*\s*(.*?)\s*```$").expect("Invalid CODE_FENCE_REGEX")
});

/// Refusal phrases that indicate the model declined to process.
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

/// A term with its translation and explanation, included once per book.
#[derive(Debug, Clone, PartialEq)]
pub struct GlossaryEntry {
    /// The term exactly as written in the source.
    pub term: String,

    /// Target-language rendering of the term.
    pub translation: String,

    /// One or two sentences explaining the term.
    pub explanation: String,
}

/// Request body for the chat completions API.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
}

/// A message in the conversation.
#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
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

/// Parsed term entry from LLM response.
#[derive(Debug, Deserialize)]
struct ParsedTermEntry {
    term: Option<String>,
    translation: Option<String>,
    explanation: Option<String>,
}

/// Parsed terms response from LLM.
#[derive(Debug, Deserialize)]
struct ParsedTermsResponse {
    terms: Vec<ParsedTermEntry>,
}

/// Keeps the first occurrence of each term and caps the total count.
///
/// Term comparison is exact: the scout is told to copy terms verbatim,
/// so two spellings are two terms.
pub fn dedup_terms(entries: Vec<GlossaryEntry>, max_terms: usize) -> Vec<GlossaryEntry> {
    let mut seen = std::collections::HashSet::new();
    let mut result = Vec::new();

    for entry in entries {
        if result.len() >= max_terms {
            break;
        }
        if seen.insert(entry.term.clone()) {
            result.push(entry);
        }
    }

    result
}

/// Glossary Scout for extracting notable terms from source text.
pub struct GlossaryScout {
    /// HTTP client for API requests.
    client: Client,
    /// API configuration.
    api_config: ApiConfig,
    /// Glossary behavior configuration.
    glossary_config: GlossaryConfig,
    /// System prompt for term extraction.
    prompt: String,
    /// Console for output.
    console: Console,
}

impl GlossaryScout {
    /// Create a new GlossaryScout.
    pub fn new(api_config: ApiConfig, glossary_config: GlossaryConfig, prompt: String) -> Self {
        Self {
            client: Client::new(),
            api_config,
            glossary_config,
            prompt,
            console: Console::new(),
        }
    }

    /// Collect glossary terms from text, processing in chunks.
    ///
    /// Duplicate terms keep their first occurrence and the result is
    /// capped at the configured maximum. Chunks that fail all retries
    /// are skipped with a warning; the run never fails here.
    pub async fn collect_terms(&self, text: &str) -> Vec<GlossaryEntry> {
        let chunks = self.split_into_chunks(text);
        let total_chunks = chunks.len();
        let mut collected: Vec<GlossaryEntry> = Vec::new();

        for (i, chunk) in chunks.iter().enumerate() {
            let chunk_num = i + 1;
            self.console.info(&format!(
                "Glossary scout chunk {}/{} ({} chars)",
                chunk_num,
                total_chunks,
                chunk.len()
            ));

            // Retry loop for refusals and JSON parsing
            let mut attempt = 0;
            let mut success = false;

            while attempt < self.glossary_config.json_retries && !success {
                match self.call_model(chunk).await {
                    Ok(raw_response) => {
                        let lower = raw_response.to_lowercase();
                        if REFUSAL_PHRASES.iter().any(|p| lower.starts_with(p)) {
                            self.console.warning(&format!(
                                "Model refused to process chunk {}, retrying...",
                                chunk_num
                            ));
                            attempt += 1;
                            tokio::time::sleep(Duration::from_secs(2u64.pow(attempt))).await;
                            continue;
                        }

                        match self.parse_response(&raw_response) {
                            Ok(entries) => {
                                if !entries.is_empty() {
                                    self.console.success(&format!(
                                        "Found {} terms in chunk {}",
                                        entries.len(),
                                        chunk_num
                                    ));
                                    collected.extend(entries);
                                }
                                success = true;
                            }
                            Err(e) => {
                                self.console.warning(&format!(
                                    "Failed to parse JSON from chunk {}: {}, retrying...",
                                    chunk_num, e
                                ));
                                attempt += 1;
                                tokio::time::sleep(Duration::from_secs(2u64.pow(attempt))).await;
                            }
                        }
                    }
                    Err(e) => {
                        self.console.warning(&format!(
                            "API error for chunk {}: {}, retrying...",
                            chunk_num, e
                        ));
                        attempt += 1;
                        tokio::time::sleep(Duration::from_secs(2u64.pow(attempt))).await;
                    }
                }
            }

            if !success {
                self.console.warning(&format!(
                    "Skipping glossary chunk {} after {} attempts",
                    chunk_num, self.glossary_config.json_retries
                ));
            }
        }

        dedup_terms(collected, self.glossary_config.max_terms)
    }

    /// Split text into chunks for processing.
    fn split_into_chunks(&self, text: &str) -> Vec<String> {
        let chunk_size = self.glossary_config.chunk_size_chars;
        let lines: Vec<&str> = text.lines().collect();
        let mut chunks: Vec<String> = Vec::new();
        let mut current_chunk: Vec<&str> = Vec::new();
        let mut current_size: usize = 0;

        for line in lines {
            let line_size = line.len() + if current_chunk.is_empty() { 0 } else { 1 };

            if current_size + line_size > chunk_size && !current_chunk.is_empty() {
                chunks.push(current_chunk.join("\n"));
                current_chunk = vec![line];
                current_size = line.len();
            } else {
                current_chunk.push(line);
                current_size += line_size;
            }
        }

        if !current_chunk.is_empty() {
            chunks.push(current_chunk.join("\n"));
        }

        chunks
    }

    /// Call the LLM model to extract terms.
    async fn call_model(&self, chunk: &str) -> Result<String, TranslationError> {
        let request = ChatRequest {
            model: self.api_config.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: self.prompt.clone(),
                },
                Message {
                    role: "user".to_string(),
                    content: chunk.to_string(),
                },
            ],
        };

        // Apply rate limiting delay
        if self.glossary_config.delay_between_requests_sec > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(
                self.glossary_config.delay_between_requests_sec,
            ))
            .await;
        }

        let url = format!("{}/chat/completions", self.api_config.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_config.key))
            .header("Content-Type", "application/json")
            .timeout(Duration::from_secs(60))
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

        let response_body: ChatResponse = response.json().await.map_err(|e| {
            TranslationError::ParseError(format!("Failed to parse API response: {}", e))
        })?;

        if response_body.choices.is_empty() {
            return Err(TranslationError::ParseError(
                "No choices in API response".to_string(),
            ));
        }

        Ok(response_body.choices[0].message.content.trim().to_string())
    }

    /// Parse the LLM response into glossary entries.
    fn parse_response(&self, raw: &str) -> Result<Vec<GlossaryEntry>, TranslationError> {
        let trimmed = raw.trim();

        // Remove markdown code fence if present
        let json_str = if trimmed.starts_with("```") {
            if let Some(captures) = CODE_FENCE_REGEX.captures(trimmed) {
                captures.get(1).map(|m| m.as_str()).unwrap_or(trimmed)
            } else {
                let without_start = trimmed
                    .trim_start_matches("```json")
                    .trim_start_matches("```");
                without_start.trim_end_matches("```").trim()
            }
        } else {
            trimmed
        };

        // Find JSON object boundaries
        let start = json_str.find('{');
        let end = json_str.rfind('}');

        let json_content = match (start, end) {
            (Some(s), Some(e)) if s < e => &json_str[s..=e],
            _ => {
                return Err(TranslationError::ParseError(
                    "No valid JSON object found".to_string(),
                ));
            }
        };

        let parsed: ParsedTermsResponse = serde_json::from_str(json_content)
            .map_err(|e| TranslationError::ParseError(format!("JSON parse error: {}", e)))?;

        // Entries missing any field are discarded
        let entries: Vec<GlossaryEntry> = parsed
            .terms
            .into_iter()
            .filter_map(|entry| {
                let term = entry.term?.trim().to_string();
                let translation = entry.translation?.trim().to_string();
                let explanation = entry.explanation?.trim().to_string();

                if term.is_empty() || translation.is_empty() || explanation.is_empty() {
                    return None;
                }

                Some(GlossaryEntry {
                    term,
                    translation,
                    explanation,
                })
            })
            .collect();

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::config::GlossaryConfig;

    fn make_scout() -> GlossaryScout {
        GlossaryScout::new(
            ApiConfig::default(),
            GlossaryConfig::default(),
            "Extract terms".to_string(),
        )
    }

    fn entry(term: &str, translation: &str, explanation: &str) -> GlossaryEntry {
        GlossaryEntry {
            term: term.to_string(),
            translation: translation.to_string(),
            explanation: explanation.to_string(),
        }
    }

    #[test]
    fn test_parse_valid_json() {
        let scout = make_scout();
        let json = r#"{"terms":[{"term":"哲人","translation":"Triết gia","explanation":"A philosopher."}]}"#;

        let result = scout.parse_response(json).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].term, "哲人");
        assert_eq!(result[0].translation, "Triết gia");
    }

    #[test]
    fn test_parse_json_with_code_fence() {
        let scout = make_scout();
        let json = r#"```json
{"terms":[{"term":"勇気","translation":"Dũng khí","explanation":"Courage in Adlerian philosophy."}]}
```"#;

        let result = scout.parse_response(json).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].term, "勇気");
    }

    #[test]
    fn test_parse_json_with_surrounding_text() {
        let scout = make_scout();
        let json = r#"Here are the terms I found:
{"terms":[{"term":"混沌","translation":"Hỗn độn","explanation":"Chaos."}]}
I hope this helps!"#;

        let result = scout.parse_response(json).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].term, "混沌");
    }

    #[test]
    fn test_parse_empty_terms() {
        let scout = make_scout();
        let json = r#"{"terms":[]}"#;

        let result = scout.parse_response(json).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_parse_missing_fields() {
        let scout = make_scout();
        let json = r#"{"terms":[{"term":"哲人"},{"translation":"Triết gia","explanation":"x"}]}"#;

        let result = scout.parse_response(json).unwrap();
        // Both entries should be filtered out due to missing required fields
        assert!(result.is_empty());
    }

    #[test]
    fn test_parse_invalid_json() {
        let scout = make_scout();
        let json = "This is not JSON at all";

        let result = scout.parse_response(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let entries = vec![
            entry("foo", "bar", "explanation"),
            entry("foo", "baz", "dup"),
        ];

        let result = dedup_terms(entries, 15);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].translation, "bar");
    }

    #[test]
    fn test_dedup_caps_total() {
        let entries = (0..30)
            .map(|i| entry(&format!("term{}", i), "t", "e"))
            .collect();

        let result = dedup_terms(entries, 15);
        assert_eq!(result.len(), 15);
        assert_eq!(result[0].term, "term0");
    }

    #[test]
    fn test_split_into_chunks() {
        let config = GlossaryConfig {
            chunk_size_chars: 50,
            ..Default::default()
        };

        let scout = GlossaryScout::new(ApiConfig::default(), config, String::new());

        let text = "Line one is here\nLine two is also here\nLine three continues\nLine four ends";
        let chunks = scout.split_into_chunks(text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= 60); // Allow some leeway for line boundaries
        }
    }
}
