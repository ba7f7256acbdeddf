//! Document assembly and EPUB packaging.
//!
//! Renders a [`Book`](crate::book::Book) into per-chapter XHTML with
//! distinguishable styling for original and translated text, then
//! hands the result to `epub-builder` for serialization. The EPUB is
//! generated into memory and written in a single step, so a packaging
//! failure never leaves a partial file behind.

use crate::book::{Book, ChapterContent};
use crate::error::AssemblyError;
use crate::glossary::GlossaryEntry;
use epub_builder::{EpubBuilder, EpubContent, ReferenceType, ZipLibrary};
use std::path::{Path, PathBuf};

/// Stylesheet optimized for modern e-readers.
///
/// Line-height on body only, no inline styles. Originals render in
/// regular weight, translations italic and muted.
const DEFAULT_CSS: &str = r#"@namespace epub "http://www.idpf.org/2007/ops";

body {
    font-family: Georgia, serif;
    line-height: 1.7;
    margin: 5%;
    text-align: justify;
}

h1, h2, h3, h4, h5, h6 {
    font-family: Georgia, serif;
    text-align: left;
    font-weight: normal;
    margin-top: 2em;
    margin-bottom: 1em;
}

h1 {
    font-size: 1.4em;
    border-bottom: 0.1em solid #333;
    padding-bottom: 0.3em;
}

h2 {
    font-size: 1.2em;
}

p {
    margin: 0;
    text-indent: 0;
    margin-bottom: 0.5em;
}

.original-text {
    font-size: 1.05em;
    margin-bottom: 0.3em;
    color: #000;
}

.translation {
    font-size: 1em;
    font-style: italic;
    margin-bottom: 1.8em;
    color: #333;
}

.glossary-term {
    margin: 1.5em 0;
}

.term-original {
    font-weight: bold;
    font-size: 1.1em;
    color: #000;
}

.term-arrow {
    color: #666;
}

.term-translation {
    color: #666;
    font-weight: bold;
}

.term-explanation {
    margin-top: 0.3em;
    color: #666;
}
"#;

/// Title used for the glossary chapter.
const GLOSSARY_TITLE: &str = "Glossary";

/// One chapter rendered and ready for packaging.
#[derive(Debug)]
pub struct RenderedChapter {
    /// File name inside the EPUB container.
    pub filename: String,

    /// Chapter title for the table of contents.
    pub title: String,

    /// Complete XHTML document.
    pub xhtml: String,

    /// True for the glossary chapter.
    pub is_glossary: bool,
}

/// Escape HTML special characters.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Wraps a rendered body in a complete XHTML document.
fn xhtml_document(title: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head>
    <title>{}</title>
    <link rel="stylesheet" href="stylesheet.css" type="text/css"/>
</head>
<body>
{}</body>
</html>"#,
        escape_html(title),
        body
    )
}

/// Renders one content chapter to XHTML.
///
/// Bilingual chapters emit one tagged block per pair: the original
/// paragraph in `original-text`, its translation in `translation`.
/// An empty translation still emits its block so the pairing stays
/// visible to the reader. Plain chapters emit untagged paragraphs.
pub fn render_chapter(index: usize, title: &str, content: &ChapterContent) -> RenderedChapter {
    let mut body = String::new();
    body.push_str(&format!("    <h2>{}</h2>\n", escape_html(title)));

    match content {
        ChapterContent::Plain(paragraphs) => {
            for paragraph in paragraphs {
                body.push_str(&format!("    <p>{}</p>\n", escape_html(paragraph)));
            }
        }
        ChapterContent::Bilingual(pairs) => {
            for pair in pairs {
                body.push_str(&format!(
                    "    <p class=\"original-text\">{}</p>\n",
                    escape_html(&pair.original)
                ));
                body.push_str(&format!(
                    "    <p class=\"translation\">{}</p>\n",
                    escape_html(&pair.translation)
                ));
            }
        }
    }

    RenderedChapter {
        filename: format!("chapter_{}.xhtml", index + 1),
        title: title.to_string(),
        xhtml: xhtml_document(title, &body),
        is_glossary: false,
    }
}

/// Renders the glossary chapter to XHTML.
///
/// Each entry renders as term, then translation, then explanation,
/// in that fixed order.
pub fn render_glossary(entries: &[GlossaryEntry]) -> RenderedChapter {
    let mut body = String::new();
    body.push_str(&format!("    <h1>{}</h1>\n", GLOSSARY_TITLE));

    for entry in entries {
        body.push_str(&format!(
            r#"    <div class="glossary-term">
        <p class="term-original">{}</p>
        <p><span class="term-arrow">&#8594;</span> <span class="term-translation">{}</span></p>
        <p class="term-explanation">{}</p>
    </div>
"#,
            escape_html(&entry.term),
            escape_html(&entry.translation),
            escape_html(&entry.explanation)
        ));
    }

    RenderedChapter {
        filename: "glossary.xhtml".to_string(),
        title: GLOSSARY_TITLE.to_string(),
        xhtml: xhtml_document(GLOSSARY_TITLE, &body),
        is_glossary: true,
    }
}

/// Renders every chapter of a book in reading order.
///
/// The glossary, when present, always comes first; content chapters
/// keep the order they were added in.
pub fn render_book(book: &Book) -> Result<Vec<RenderedChapter>, AssemblyError> {
    if book.chapters.is_empty() {
        return Err(AssemblyError::EmptyBook);
    }

    let mut rendered = Vec::with_capacity(book.chapters.len() + 1);

    if book.has_glossary() {
        rendered.push(render_glossary(&book.glossary));
    }

    for (i, chapter) in book.chapters.iter().enumerate() {
        rendered.push(render_chapter(i, &chapter.title, &chapter.content));
    }

    Ok(rendered)
}

/// Packages a book into an in-memory EPUB.
pub fn package(book: &Book) -> Result<Vec<u8>, AssemblyError> {
    let chapters = render_book(book)?;

    let zip = ZipLibrary::new().map_err(|e| AssemblyError::Packaging(e.to_string()))?;
    let mut builder = EpubBuilder::new(zip).map_err(|e| AssemblyError::Packaging(e.to_string()))?;

    builder
        .metadata("title", &book.meta.title)
        .map_err(|e| AssemblyError::Packaging(e.to_string()))?;
    builder
        .metadata("author", &book.meta.author)
        .map_err(|e| AssemblyError::Packaging(e.to_string()))?;
    builder
        .metadata("lang", &book.meta.language)
        .map_err(|e| AssemblyError::Packaging(e.to_string()))?;

    if let Some(ref description) = book.meta.description {
        builder
            .metadata("description", description)
            .map_err(|e| AssemblyError::Packaging(e.to_string()))?;
    }

    builder
        .stylesheet(DEFAULT_CSS.as_bytes())
        .map_err(|e| AssemblyError::Packaging(e.to_string()))?;

    for chapter in &chapters {
        let reftype = if chapter.is_glossary {
            ReferenceType::Glossary
        } else {
            ReferenceType::Text
        };

        builder
            .add_content(
                EpubContent::new(&chapter.filename, chapter.xhtml.as_bytes())
                    .title(&chapter.title)
                    .reftype(reftype),
            )
            .map_err(|e| AssemblyError::Packaging(e.to_string()))?;
    }

    let mut buffer = Vec::new();
    builder
        .generate(&mut buffer)
        .map_err(|e| AssemblyError::Packaging(e.to_string()))?;

    Ok(buffer)
}

/// Packages a book and writes it to the output directory.
///
/// The file name is derived from the book title. Returns the path of
/// the written EPUB.
pub fn write_epub(book: &Book, output_dir: &Path) -> Result<PathBuf, AssemblyError> {
    // Package fully in memory before touching the filesystem
    let bytes = package(book)?;

    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("{}.epub", filename_stem(&book.meta.title)));
    std::fs::write(&path, bytes)?;

    Ok(path)
}

/// Derives a safe, lowercase file name stem from a book title.
fn filename_stem(title: &str) -> String {
    let mut stem = String::new();
    let mut last_was_hyphen = true;

    for c in title.chars() {
        if c.is_alphanumeric() {
            stem.extend(c.to_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            stem.push('-');
            last_was_hyphen = true;
        }
    }

    let stem = stem.trim_end_matches('-').to_string();
    if stem.is_empty() { "book".to_string() } else { stem }
}
