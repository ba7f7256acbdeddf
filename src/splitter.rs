//! Section splitting for parallel translation.
//!
//! Divides source text into contiguous sections cut at natural
//! boundaries, so each section can be translated independently and
//! the pieces still concatenate back to the original text.

use crate::error::ConfigError;
use regex::Regex;
use std::sync::LazyLock;

/// Regex matching a paragraph break (blank line between paragraphs).
static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n+").expect("Invalid PARAGRAPH_BREAK"));

/// Regex matching a sentence end, including closing quotes/brackets
/// and trailing whitespace. Used as a fallback when the text has too
/// few paragraph breaks for the requested section count.
static SENTENCE_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[.!?。！？…][)\]」』"'”’]*\s*"#).expect("Invalid SENTENCE_BREAK")
});

/// A contiguous slice of the source text, translated as one unit.
#[derive(Debug, Clone)]
pub struct Section {
    /// Position of this section in the source (0-based).
    pub index: usize,

    /// The section's slice of the original text, separators included.
    pub text: String,

    /// Translated text, populated after translation. `None` when the
    /// translation failed or was never attempted.
    pub translation: Option<String>,
}

impl Section {
    /// Creates an untranslated section.
    pub fn new(index: usize, text: String) -> Self {
        Self {
            index,
            text,
            translation: None,
        }
    }
}

/// Splits source text into at most `target` contiguous sections.
///
/// Sections are cut at paragraph breaks where possible, falling back
/// to sentence ends when the text has fewer paragraphs than requested.
/// Each section keeps its trailing separator characters, so joining
/// all section texts in index order reproduces the input exactly.
///
/// Returns fewer sections than requested when the text doesn't have
/// enough natural boundaries. Fails only on empty (or whitespace-only)
/// input.
pub fn split_into_sections(text: &str, target: usize) -> Result<Vec<Section>, ConfigError> {
    if text.trim().is_empty() {
        return Err(ConfigError::EmptySource(
            "cannot build a book from empty text".to_string(),
        ));
    }

    let target = target.max(1);
    let cuts = pick_cut_points(text, target);

    let mut sections = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for &cut in &cuts {
        sections.push(Section::new(sections.len(), text[start..cut].to_string()));
        start = cut;
    }
    sections.push(Section::new(sections.len(), text[start..].to_string()));

    Ok(sections)
}

/// Collects candidate cut offsets and picks the ones closest to an
/// even division of the text into `target` pieces.
fn pick_cut_points(text: &str, target: usize) -> Vec<usize> {
    if target <= 1 {
        return Vec::new();
    }

    // Paragraph breaks first; the offset after the blank-line run is a
    // candidate, so the separator stays attached to the section before it.
    let mut candidates: Vec<usize> = PARAGRAPH_BREAK.find_iter(text).map(|m| m.end()).collect();

    // Not enough paragraphs: widen to sentence ends.
    if candidates.len() + 1 < target {
        candidates.extend(SENTENCE_BREAK.find_iter(text).map(|m| m.end()));
        candidates.sort_unstable();
        candidates.dedup();
    }

    // A cut at the very end would produce an empty trailing section.
    candidates.retain(|&offset| offset > 0 && offset < text.len());

    let mut cuts = Vec::new();
    let mut prev = 0usize;
    for k in 1..target {
        let ideal = text.len() * k / target;
        let best = candidates
            .iter()
            .copied()
            .filter(|&c| c > prev)
            .min_by_key(|&c| c.abs_diff(ideal));
        if let Some(cut) = best {
            cuts.push(cut);
            prev = cut;
        }
    }
    cuts
}
