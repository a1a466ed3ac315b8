//! Error types for the CodeRAG CLI.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: corpus parsing, index lookups, retrieval, prompt
//! rendering, and answer synthesis. Retrieval and synthesis failures are
//! distinct variants so a caller can keep an assembled context even when
//! the synthesizer call fails.

use thiserror::Error;

/// Unified error type for the CodeRAG CLI.
///
/// All functions in the application return `Result<T, AppError>`.
/// Errors are represented and propagated, never panicked on.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Corpus parse errors, fatal to index load
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A section id that does not exist in the index
    #[error("Section not found: {0}")]
    NotFound(String),

    /// Retrieval was attempted against an index with no sections
    #[error("Document index contains no sections")]
    EmptyIndex,

    /// Retrieval-stage errors other than an empty index
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Prompt rendering errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Answer synthesizer errors (external collaborator)
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Build a parse error with the offending line number.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        AppError::Parse {
            line,
            message: message.into(),
        }
    }

    /// True if this error came from the external synthesizer rather than
    /// from retrieval or assembly. The assembled context is still valid
    /// when this returns true.
    pub fn is_synthesis(&self) -> bool {
        matches!(self, AppError::Synthesis(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
