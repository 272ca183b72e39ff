//! Error types for the symcat library.
//!
//! Only environment problems are errors. Content mistakes in the sources
//! (unknown macros, undefined citations, dangling labels) are reported as
//! [`Diagnostic`](crate::diagnostics::Diagnostic)s and never abort a stage.

use thiserror::Error;

/// Result type alias for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Attach the offending path to an IO error.
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

/// Errors that occur while turning source text into a document tree.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid BibTeX: {0}")]
    BibTeX(String),

    #[error("External parser failed: {0}")]
    External(String),

    #[error("Invalid parser output: {0}")]
    Output(String),
}

/// Errors that occur while loading the data the resolution passes need.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("Failed to read bibliography file: {0}")]
    BibliographyRead(String),

    #[error("Invalid bibliography database: {0}")]
    BibliographyFormat(String),

    #[error("Missing intermediate artifact: {0}")]
    MissingArtifact(String),
}

/// Errors that occur during rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Math rendering error: {0}")]
    Math(String),

    #[error("Template error: {0}")]
    Template(String),
}

/// Errors in the site configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration file {path}: {message}")]
    File { path: String, message: String },

    #[error("Invalid value for {name}: {message}")]
    Value { name: String, message: String },
}
