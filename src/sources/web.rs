//! Web page source loader.
//!
//! Fetches a URL and harvests readable text from its paragraph
//! elements, falling back to the whole document text for pages
//! without `<p>` markup.

use super::{SourceLoader, create_http_client, rate_limit};
use crate::config::FetchingConfig;
use crate::error::SourceError;
use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

/// Web source loader for http/https URLs.
pub struct WebSource {
    client: reqwest::Client,
    config: FetchingConfig,
}

impl WebSource {
    /// Creates a new web loader with the given configuration.
    pub fn new(config: FetchingConfig) -> Self {
        let client = create_http_client().expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Fetches a page and returns its raw HTML.
    async fn fetch_page(&self, url: &str) -> Result<String, SourceError> {
        rate_limit(self.config.delay_between_requests_sec).await;

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(SourceError::HttpError(
                response.error_for_status().unwrap_err(),
            ));
        }

        Ok(response.text().await?)
    }
}

/// Extracts readable text from an HTML document.
///
/// Paragraph elements joined by blank lines; pages without `<p>`
/// markup degrade to the document's visible text node by node.
fn extract_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let paragraph = Selector::parse("p").expect("Invalid paragraph selector");

    let paragraphs: Vec<String> = doc
        .select(&paragraph)
        .map(|p| p.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();

    if !paragraphs.is_empty() {
        return paragraphs.join("\n\n");
    }

    doc.root_element()
        .text()
        .map(|node| node.trim())
        .filter(|node| !node.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl SourceLoader for WebSource {
    fn name(&self) -> &'static str {
        "Web"
    }

    fn can_handle(&self, input: &str) -> bool {
        Url::parse(input).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
    }

    async fn load(&self, input: &str) -> Result<String, SourceError> {
        Url::parse(input).map_err(|e| SourceError::InvalidUrl(format!("{}: {}", input, e)))?;

        let html = self.fetch_page(input).await?;
        let text = extract_text(&html);

        if text.trim().is_empty() {
            return Err(SourceError::EmptyContent(input.to_string()));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_handle_http_urls_only() {
        let source = WebSource::new(FetchingConfig::default());
        assert!(source.can_handle("https://example.com/article"));
        assert!(source.can_handle("http://example.com"));
        assert!(!source.can_handle("ftp://example.com/file"));
        assert!(!source.can_handle("notes.txt"));
    }

    #[test]
    fn test_extract_paragraph_text() {
        let html = r#"<html><body>
            <nav>Menu</nav>
            <p>First paragraph of the article.</p>
            <p>  Second paragraph with <em>markup</em> inside.  </p>
            <p>   </p>
        </body></html>"#;

        let text = extract_text(html);
        assert_eq!(
            text,
            "First paragraph of the article.\n\nSecond paragraph with markup inside."
        );
    }

    #[test]
    fn test_extract_falls_back_without_paragraphs() {
        let html = "<html><body><div>Just a bare div.</div></body></html>";
        let text = extract_text(html);
        assert_eq!(text, "Just a bare div.");
    }
}
