//! Error types for arcdex.
//!
//! Library crates use [`ArcdexError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all arcdex operations.
#[derive(Debug, thiserror::Error)]
pub enum ArcdexError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching wiki pages or images.
    #[error("network error: {0}")]
    Network(String),

    /// HTML parsing or field extraction error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (empty scrape, bad cache shape, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// JSON encoding/decoding error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ArcdexError>;

impl ArcdexError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for ArcdexError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ArcdexError::config("no categories configured");
        assert_eq!(err.to_string(), "config error: no categories configured");

        let err = ArcdexError::validation("no items were scraped");
        assert!(err.to_string().contains("no items"));
    }

    #[test]
    fn io_error_carries_path() {
        let err = ArcdexError::io(
            "output/items_data.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(err.to_string().contains("items_data.json"));
    }
}
