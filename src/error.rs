//! Error types for the Seihon application.
//!
//! Uses `thiserror` for structured error definitions that provide
//! clear context about what went wrong.

use thiserror::Error;

/// Main error type for source loading operations.
#[derive(Error, Debug)]
pub enum SourceError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Failed to read a local file
    #[error("Failed to read file: {0}")]
    ReadError(#[from] std::io::Error),

    /// URL parsing or validation failed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Fetched page contained no extractable text
    #[error("No readable text found: {0}")]
    EmptyContent(String),

    /// No loader accepts this input identifier
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),
}

/// Error type for configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// Missing required configuration value
    #[error("Missing required config value: {0}")]
    MissingValue(String),

    /// Invalid configuration value
    #[error("Invalid config value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Config directory not found
    #[error("Could not determine config directory")]
    NoConfigDir,

    /// The input text cannot produce a book
    #[error("Empty source text: {0}")]
    EmptySource(String),
}

/// Error type for translation operations.
#[derive(Error, Debug)]
pub enum TranslationError {
    /// HTTP request to API failed
    #[error("API request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error: {0}")]
    ApiError(String),

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Translation was refused by the model
    #[error("Translation refused: {0}")]
    Refused(String),

    /// Section translation did not complete within the deadline
    #[error("Translation timed out after {seconds}s")]
    TimedOut { seconds: u64 },
}

/// Error type for document assembly and EPUB packaging.
#[derive(Error, Debug)]
pub enum AssemblyError {
    /// The packaging library rejected the assembled document
    #[error("EPUB packaging failed: {0}")]
    Packaging(String),

    /// Failed to write the finished EPUB to disk
    #[error("Failed to write output file: {0}")]
    WriteError(#[from] std::io::Error),

    /// The book has nothing to package
    #[error("Book has no chapters")]
    EmptyBook,
}

/// Result type alias using anyhow for application-level error handling.
pub type Result<T> = anyhow::Result<T>;
