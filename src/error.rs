use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for structure extraction and API analysis.
///
/// Every public entry point returns these explicitly; expected conditions
/// (missing file, unsupported language, parse failure) never panic. A failed
/// file in a batch operation carries its own error and does not abort the
/// batch.
#[derive(Error, Debug)]
pub enum Error {
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Unsupported file type: {extension}")]
    UnsupportedLanguage { extension: String },

    #[error("No grammar available for language: {language}")]
    GrammarUnavailable { language: String },

    #[error("Failed to parse {context}: {message}")]
    ParseFailure { context: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a parse failure scoped to a file or snippet
    pub fn parse_failure(context: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ParseFailure {
            context: context.into(),
            message: message.into(),
        }
    }
}
