//! Book model: metadata, chapters, and glossary.
//!
//! Entities here are built once per generation run and handed to the
//! assembler; nothing persists or mutates after assembly.

use crate::aggregator::{ParagraphPair, paragraphs};
use crate::glossary::GlossaryEntry;
use regex::Regex;
use std::sync::LazyLock;

/// Regex matching a markdown-style heading line.
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#+\s+(.+)$").expect("Invalid HEADING"));

/// Book-level metadata.
#[derive(Debug, Clone)]
pub struct BookMeta {
    /// Book title.
    pub title: String,

    /// Author name.
    pub author: String,

    /// Language code (e.g. "en", "vi", "zh").
    pub language: String,

    /// Optional description.
    pub description: Option<String>,
}

impl BookMeta {
    /// Creates metadata with the default author and language.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: "Unknown".to_string(),
            language: "en".to_string(),
            description: None,
        }
    }
}

/// Content of one chapter.
#[derive(Debug, Clone)]
pub enum ChapterContent {
    /// Plain paragraphs in source order.
    Plain(Vec<String>),

    /// Paragraph-aligned bilingual pairs in source order.
    Bilingual(Vec<ParagraphPair>),
}

/// A named, ordered sequence of content blocks within a book.
#[derive(Debug, Clone)]
pub struct Chapter {
    /// Chapter title.
    pub title: String,

    /// Chapter body.
    pub content: ChapterContent,
}

impl Chapter {
    /// Creates a monolingual chapter, splitting the body into paragraphs.
    pub fn plain(title: impl Into<String>, body: &str) -> Self {
        Self {
            title: title.into(),
            content: ChapterContent::Plain(paragraphs(body)),
        }
    }

    /// Creates a bilingual chapter from aligned paragraph pairs.
    pub fn bilingual(title: impl Into<String>, pairs: Vec<ParagraphPair>) -> Self {
        Self {
            title: title.into(),
            content: ChapterContent::Bilingual(pairs),
        }
    }

    /// True when this chapter holds bilingual pairs.
    pub fn is_bilingual(&self) -> bool {
        matches!(self.content, ChapterContent::Bilingual(_))
    }
}

/// A complete book ready for assembly.
#[derive(Debug, Clone)]
pub struct Book {
    /// Book metadata.
    pub meta: BookMeta,

    /// Glossary entries; empty means no glossary chapter is emitted.
    pub glossary: Vec<GlossaryEntry>,

    /// Content chapters, in the order they were added.
    pub chapters: Vec<Chapter>,
}

impl Book {
    /// Creates an empty book with the given metadata.
    pub fn new(meta: BookMeta) -> Self {
        Self {
            meta,
            glossary: Vec::new(),
            chapters: Vec::new(),
        }
    }

    /// Appends a content chapter. Order of calls is reading order.
    pub fn add_chapter(&mut self, chapter: Chapter) {
        self.chapters.push(chapter);
    }

    /// Sets the glossary for this book.
    pub fn set_glossary(&mut self, entries: Vec<GlossaryEntry>) {
        self.glossary = entries;
    }

    /// True when a glossary chapter will be emitted.
    pub fn has_glossary(&self) -> bool {
        !self.glossary.is_empty()
    }
}

/// Splits text with markdown-style headings into (title, body) chapters.
///
/// Returns `None` when the text has no headings, or when content
/// precedes the first heading (splitting there would lose that
/// preamble; the caller falls back to a single chapter instead).
pub fn split_heading_chapters(text: &str) -> Option<Vec<(String, String)>> {
    let mut chapters: Vec<(String, String)> = Vec::new();

    for line in text.lines() {
        if let Some(captures) = HEADING.captures(line) {
            let title = captures.get(1).map(|m| m.as_str().trim()).unwrap_or("");
            chapters.push((title.to_string(), String::new()));
        } else if let Some((_, body)) = chapters.last_mut() {
            body.push_str(line);
            body.push('\n');
        } else if !line.trim().is_empty() {
            // Content before the first heading
            return None;
        }
    }

    if chapters.is_empty() {
        return None;
    }

    Some(chapters)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_defaults() {
        let meta = BookMeta::new("My Book");
        assert_eq!(meta.title, "My Book");
        assert_eq!(meta.author, "Unknown");
        assert_eq!(meta.language, "en");
        assert!(meta.description.is_none());
    }

    #[test]
    fn test_chapters_preserve_order() {
        let mut book = Book::new(BookMeta::new("Ordered"));
        book.add_chapter(Chapter::plain("One", "First."));
        book.add_chapter(Chapter::plain("Two", "Second."));

        assert_eq!(book.chapters[0].title, "One");
        assert_eq!(book.chapters[1].title, "Two");
    }

    #[test]
    fn test_plain_chapter_splits_paragraphs() {
        let chapter = Chapter::plain("Intro", "First para.\n\nSecond para.");
        let ChapterContent::Plain(ref paras) = chapter.content else {
            panic!("expected plain chapter");
        };
        assert_eq!(paras.len(), 2);
        assert!(!chapter.is_bilingual());
    }

    #[test]
    fn test_glossary_flag() {
        let mut book = Book::new(BookMeta::new("G"));
        assert!(!book.has_glossary());

        book.set_glossary(vec![GlossaryEntry {
            term: "foo".to_string(),
            translation: "bar".to_string(),
            explanation: "a term".to_string(),
        }]);
        assert!(book.has_glossary());
    }

    #[test]
    fn test_heading_split_basic() {
        let text = "# Introduction\n\nIntro text here.\n\n# Chapter 1\n\nStory begins.\n";
        let chapters = split_heading_chapters(text).unwrap();

        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].0, "Introduction");
        assert!(chapters[0].1.contains("Intro text here."));
        assert_eq!(chapters[1].0, "Chapter 1");
        assert!(chapters[1].1.contains("Story begins."));
    }

    #[test]
    fn test_heading_split_no_headings() {
        assert!(split_heading_chapters("Just plain text.\n\nMore text.").is_none());
    }

    #[test]
    fn test_heading_split_preamble_rejected() {
        let text = "Some preamble.\n\n# Chapter 1\n\nBody.";
        assert!(split_heading_chapters(text).is_none());
    }

    #[test]
    fn test_heading_split_deeper_levels() {
        let text = "## Part One\nBody one.\n### Part Two\nBody two.";
        let chapters = split_heading_chapters(text).unwrap();
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].0, "Part One");
        assert_eq!(chapters[1].0, "Part Two");
    }
}
