//! Translation aggregation.
//!
//! Runs one translation task per section concurrently, then
//! reassembles the results by section index into paragraph-aligned
//! bilingual pairs. A failed or timed-out section degrades to empty
//! translations for its paragraphs; source text is never dropped.

use crate::console::Console;
use crate::error::TranslationError;
use crate::splitter::Section;
use crate::translator::Translator;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

/// Regex splitting text into paragraphs at blank lines.
static PARAGRAPH_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n+").expect("Invalid PARAGRAPH_SPLIT"));

/// One original paragraph aligned with its (possibly absent) translation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphPair {
    /// Paragraph text from the source.
    pub original: String,

    /// Translated paragraph text, empty when no translation is available.
    pub translation: String,

    /// Index of the section this pair came from.
    pub section_index: usize,
}

/// Result of aggregating all sections of a book.
#[derive(Debug, Default)]
pub struct Aggregate {
    /// All paragraph pairs, in source order.
    pub pairs: Vec<ParagraphPair>,

    /// Indices of sections whose translation was missing entirely.
    pub missing_sections: Vec<usize>,

    /// Count of translated paragraphs that had no original to pair with.
    pub dropped_translations: usize,
}

impl Aggregate {
    /// True when every section translated cleanly.
    pub fn is_complete(&self) -> bool {
        self.missing_sections.is_empty() && self.dropped_translations == 0
    }
}

/// Splits text into trimmed, non-empty paragraphs.
pub fn paragraphs(text: &str) -> Vec<String> {
    PARAGRAPH_SPLIT
        .split(text)
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Translates all sections concurrently and fills in their results.
///
/// Each section is an independent unit of work with its own deadline.
/// A section that fails all retries or misses the deadline keeps
/// `translation: None`; the run continues with the rest.
pub async fn translate_sections(
    translator: &Translator,
    sections: Vec<Section>,
    timeout_sec: u64,
    console: &Console,
) -> Vec<Section> {
    let deadline = Duration::from_secs(timeout_sec);

    let mut tasks: FuturesUnordered<_> = sections
        .into_iter()
        .map(|mut section| async move {
            let result =
                tokio::time::timeout(deadline, translator.translate_section(&section.text)).await;

            match result {
                Ok(Ok(translated)) => section.translation = Some(translated),
                Ok(Err(e)) => {
                    console.warning(&format!(
                        "Section {} failed to translate: {}",
                        section.index + 1,
                        e
                    ));
                }
                Err(_) => {
                    let e = TranslationError::TimedOut {
                        seconds: timeout_sec,
                    };
                    console.warning(&format!(
                        "Section {} failed to translate: {}",
                        section.index + 1,
                        e
                    ));
                }
            }

            section
        })
        .collect();

    // Collect in completion order, then restore source order by index.
    let mut done = Vec::new();
    while let Some(section) = tasks.next().await {
        done.push(section);
    }
    done.sort_by_key(|s| s.index);
    done
}

/// Pairs one section's original paragraphs with its translation.
///
/// Paragraph i of the original aligns with paragraph i of the
/// translation, up to the shorter count. Excess original paragraphs
/// get an empty translation; excess translated paragraphs are counted
/// as dropped. A missing translation pairs every paragraph with "".
pub fn pair_section(section: &Section) -> (Vec<ParagraphPair>, usize) {
    let originals = paragraphs(&section.text);
    let translated = section
        .translation
        .as_deref()
        .map(paragraphs)
        .unwrap_or_default();

    let dropped = translated.len().saturating_sub(originals.len());

    let pairs = originals
        .into_iter()
        .enumerate()
        .map(|(i, original)| ParagraphPair {
            original,
            translation: translated.get(i).cloned().unwrap_or_default(),
            section_index: section.index,
        })
        .collect();

    (pairs, dropped)
}

/// Reassembles sections into an ordered run of paragraph pairs.
///
/// Sections are ordered by index, never by the order they finished
/// translating in.
pub fn aggregate(mut sections: Vec<Section>) -> Aggregate {
    sections.sort_by_key(|s| s.index);

    let mut result = Aggregate::default();
    for section in &sections {
        if section.translation.is_none() {
            result.missing_sections.push(section.index);
        }

        let (pairs, dropped) = pair_section(section);
        result.pairs.extend(pairs);
        result.dropped_translations += dropped;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(index: usize, text: &str, translation: Option<&str>) -> Section {
        Section {
            index,
            text: text.to_string(),
            translation: translation.map(|t| t.to_string()),
        }
    }

    #[test]
    fn test_paragraphs_split_on_blank_lines() {
        let text = "First one.\n\nSecond one.\n \nThird one.";
        assert_eq!(paragraphs(text), vec!["First one.", "Second one.", "Third one."]);
    }

    #[test]
    fn test_aligned_translation_pairs() {
        let s = section(
            0,
            "Hello world.\n\nGoodbye now.",
            Some("Xin chào thế giới.\n\nTạm biệt nhé."),
        );

        let (pairs, dropped) = pair_section(&s);
        assert_eq!(dropped, 0);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].original, "Hello world.");
        assert_eq!(pairs[0].translation, "Xin chào thế giới.");
        assert_eq!(pairs[1].original, "Goodbye now.");
        assert_eq!(pairs[1].translation, "Tạm biệt nhé.");
    }

    #[test]
    fn test_missing_translation_keeps_every_paragraph() {
        let s = section(0, "Hello world.\n\nGoodbye now.", None);

        let (pairs, dropped) = pair_section(&s);
        assert_eq!(dropped, 0);
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|p| p.translation.is_empty()));
        assert_eq!(pairs[0].original, "Hello world.");
    }

    #[test]
    fn test_short_translation_pads_with_empty() {
        let s = section(
            0,
            "One.\n\nTwo.\n\nThree.",
            Some("Eins.\n\nZwei."),
        );

        let (pairs, _) = pair_section(&s);
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[2].original, "Three.");
        assert_eq!(pairs[2].translation, "");
    }

    #[test]
    fn test_long_translation_counts_dropped() {
        let s = section(0, "Only one.", Some("Uno.\n\nDos.\n\nTres."));

        let (pairs, dropped) = pair_section(&s);
        assert_eq!(pairs.len(), 1);
        assert_eq!(dropped, 2);
        assert_eq!(pairs[0].translation, "Uno.");
    }

    #[test]
    fn test_aggregate_orders_by_section_index() {
        // Sections arrive in completion order, not source order
        let sections = vec![
            section(2, "Third.", Some("Dritte.")),
            section(0, "First.", Some("Erste.")),
            section(1, "Second.", None),
        ];

        let result = aggregate(sections);
        assert_eq!(result.pairs.len(), 3);
        assert_eq!(result.pairs[0].original, "First.");
        assert_eq!(result.pairs[1].original, "Second.");
        assert_eq!(result.pairs[2].original, "Third.");
        assert_eq!(result.missing_sections, vec![1]);
        assert!(!result.is_complete());
    }

    #[test]
    fn test_aggregate_complete_run() {
        let sections = vec![
            section(0, "A.", Some("Ah.")),
            section(1, "B.", Some("Beh.")),
        ];

        let result = aggregate(sections);
        assert!(result.is_complete());
        assert!(result.missing_sections.is_empty());
    }

    #[test]
    fn test_pair_carries_section_index() {
        let sections = vec![
            section(0, "A.\n\nB.", Some("Ah.\n\nBeh.")),
            section(1, "C.", Some("Tseh.")),
        ];

        let result = aggregate(sections);
        assert_eq!(result.pairs[0].section_index, 0);
        assert_eq!(result.pairs[1].section_index, 0);
        assert_eq!(result.pairs[2].section_index, 1);
    }
}
