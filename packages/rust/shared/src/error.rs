//! Error types for termdeck.
//!
//! Library crates use [`TermDeckError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all termdeck operations.
#[derive(Debug, thiserror::Error)]
pub enum TermDeckError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad input, malformed values).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The definition cache could not be read or parsed at startup.
    #[error("cache load error at {path:?}: {message}")]
    CacheLoad { path: PathBuf, message: String },

    /// The definition cache could not be persisted at shutdown.
    #[error("cache flush error at {path:?}: {message}")]
    CacheFlush { path: PathBuf, message: String },

    /// The definition provider failed for a specific term.
    #[error("provider error for term {term:?}: {message}")]
    Provider { term: String, message: String },

    /// Building or writing the output package failed.
    #[error("packaging error: {0}")]
    Packaging(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TermDeckError>;

impl TermDeckError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a provider error for `term`.
    pub fn provider(term: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Provider {
            term: term.into(),
            message: msg.into(),
        }
    }

    /// Create a packaging error from any displayable message.
    pub fn packaging(msg: impl Into<String>) -> Self {
        Self::Packaging(msg.into())
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
