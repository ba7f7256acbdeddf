//! Seihon CLI - EPUB maker with bilingual translation support.

use anyhow::{Context, Result};
use clap::Parser;
use seihon::aggregator::{aggregate, translate_sections};
use seihon::assembler::write_epub;
use seihon::book::{Book, BookMeta, Chapter, split_heading_chapters};
use seihon::config::Config;
use seihon::console::Console;
use seihon::error::{ConfigError, SourceError};
use seihon::glossary::GlossaryScout;
use seihon::sources::SourceRegistry;
use seihon::splitter::split_into_sections;
use seihon::translator::{LanguagePair, Translator, render_prompt};
use std::path::PathBuf;

/// EPUB maker with bilingual translation support.
#[derive(Parser, Debug)]
#[command(name = "seihon")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Source of the text: a file path, an http(s) URL, or `-` for stdin.
    input: String,

    /// Book title.
    #[arg(long)]
    title: String,

    /// Author name.
    #[arg(long)]
    author: Option<String>,

    /// Book language code (e.g. "en", "vi", "zh").
    #[arg(long)]
    language: Option<String>,

    /// Book description.
    #[arg(long)]
    description: Option<String>,

    /// Produce a bilingual edition with paragraph-aligned translations.
    #[arg(long)]
    bilingual: bool,

    /// Language the source text is written in (e.g. "Chinese").
    #[arg(long)]
    source_lang: Option<String>,

    /// Language to translate into (e.g. "Vietnamese").
    #[arg(long)]
    target_lang: Option<String>,

    /// Include a glossary of notable terms.
    #[arg(long)]
    glossary: bool,

    /// Number of sections to split the text into for translation.
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    sections: Option<u16>,

    /// Output directory for the finished EPUB.
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Args {
    /// The language pair for translation and glossary prompts.
    ///
    /// Only valid once `validate` has passed.
    fn language_pair(&self) -> LanguagePair {
        LanguagePair {
            source: self.source_lang.clone().unwrap_or_default(),
            target: self.target_lang.clone().unwrap_or_default(),
        }
    }

    /// Checks argument combinations clap can't express.
    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            anyhow::bail!("--title must not be empty");
        }

        if (self.bilingual || self.glossary)
            && (self.source_lang.is_none() || self.target_lang.is_none())
        {
            anyhow::bail!(
                "--bilingual and --glossary require both --source-lang and --target-lang"
            );
        }

        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let console = Console::new();

    console.section("Seihon - EPUB Maker");

    args.validate()?;

    // Load configuration
    console.step("Loading configuration...");
    let config = Config::load().context("Failed to load configuration")?;

    // Translation and glossary runs need a working API key
    let needs_api = args.bilingual || args.glossary;
    if needs_api && !config.api.is_configured() {
        let config_path = Config::config_path()?;
        console.warning(&format!(
            "API key not configured. Please edit: {}",
            config_path.display()
        ));
        console.info("Set your OpenAI-compatible API key in the config file and run again.");
        return Ok(());
    }

    config.validate(needs_api).context("Invalid configuration")?;
    console.success("Configuration loaded");

    // Find appropriate source loader
    console.step("Finding loader for input...");
    let registry = SourceRegistry::new(&config.fetching);
    let loader = registry
        .find_for_input(&args.input)
        .ok_or_else(|| SourceError::UnsupportedInput(args.input.clone()))?;

    console.success(&format!("Using {} source", loader.name()));

    // Load source text
    console.step("Loading source text...");
    let text = loader
        .load(&args.input)
        .await
        .context("Failed to load source text")?;

    if text.trim().is_empty() {
        return Err(ConfigError::EmptySource(format!(
            "source '{}' contained no text",
            args.input
        )))
        .context("Cannot build a book");
    }

    console.success(&format!(
        "Loaded {} characters",
        console.count(text.chars().count())
    ));

    // Build metadata
    let mut meta = BookMeta::new(args.title.clone());
    if let Some(ref author) = args.author {
        meta.author = author.clone();
    }
    if let Some(ref language) = args.language {
        meta.language = language.clone();
    }
    meta.description = args.description.clone();

    let mut book = Book::new(meta);
    let mut warnings = 0usize;

    if args.bilingual {
        warnings += build_bilingual_chapter(&args, &config, &text, &mut book, &console).await?;
    } else {
        build_plain_chapters(&args, &text, &mut book, &console);
    }

    if args.glossary {
        console.step("Collecting glossary terms...");
        let prompt = render_prompt(&config.prompts.glossary_scout, &args.language_pair());
        let scout = GlossaryScout::new(config.api.clone(), config.glossary.clone(), prompt);
        let entries = scout.collect_terms(&text).await;

        if entries.is_empty() {
            console.warning("No glossary terms collected, omitting glossary");
            warnings += 1;
        } else {
            console.success(&format!("Collected {} glossary terms", entries.len()));
            book.set_glossary(entries);
        }
    }

    // Package and write
    console.step("Packaging EPUB...");
    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(|| config.paths.output_directory.clone());
    let path = write_epub(&book, &output_dir).context("Failed to package EPUB")?;
    console.success(&format!("Wrote {}", path.display()));

    if warnings > 0 {
        console.warning(&format!("Completed with {} warning(s)", warnings));
    }

    console.section("Done!");
    Ok(())
}

/// Splits, translates, and aggregates the text into one bilingual
/// chapter. Returns the number of warnings raised.
async fn build_bilingual_chapter(
    args: &Args,
    config: &Config,
    text: &str,
    book: &mut Book,
    console: &Console,
) -> Result<usize> {
    let languages = args.language_pair();
    let target_sections = args
        .sections
        .map(|n| n as usize)
        .unwrap_or(config.translation.default_sections);

    console.step(&format!("Splitting into ~{} sections...", target_sections));
    let sections =
        split_into_sections(text, target_sections).context("Failed to split source text")?;
    console.success(&format!("Split into {} sections", sections.len()));

    let translator = Translator::new(
        config.api.clone(),
        config.translation.clone(),
        &config.prompts,
        &languages,
    );

    console.step(&format!(
        "Translating {} sections ({} to {})...",
        sections.len(),
        languages.source,
        languages.target
    ));
    let translated = translate_sections(
        &translator,
        sections,
        config.translation.timeout_per_section_sec,
        console,
    )
    .await;

    let result = aggregate(translated);
    let mut warnings = 0;

    if !result.missing_sections.is_empty() {
        console.warning(&format!(
            "{} of the sections have no translation; their paragraphs are kept untranslated",
            result.missing_sections.len()
        ));
        warnings += 1;
    }

    if result.dropped_translations > 0 {
        console.warning(&format!(
            "{} translated paragraphs had no original to pair with and were dropped",
            result.dropped_translations
        ));
        warnings += 1;
    }

    console.success(&format!(
        "Assembled {} paragraph pairs",
        result.pairs.len()
    ));

    // Use a translated chapter title when the model provides one
    let chapter_title = match translator.translate_title(&args.title).await {
        Ok(title) if !title.is_empty() => title,
        _ => args.title.clone(),
    };

    book.add_chapter(Chapter::bilingual(chapter_title, result.pairs));
    Ok(warnings)
}

/// Builds monolingual chapters, splitting on markdown headings when
/// the text starts with one.
fn build_plain_chapters(args: &Args, text: &str, book: &mut Book, console: &Console) {
    match split_heading_chapters(text) {
        Some(chapters) => {
            console.info(&format!("Found {} heading chapters", chapters.len()));
            for (title, body) in chapters {
                book.add_chapter(Chapter::plain(title, &body));
            }
        }
        None => {
            book.add_chapter(Chapter::plain(args.title.clone(), text));
        }
    }
}
