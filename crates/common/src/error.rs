//! Error types shared across RepSense crates.

use std::path::{Path, PathBuf};

/// Top-level error type for RepSense operations.
///
/// Library crates keep their own focused error enums; this type is what
/// tools and embedding applications funnel them into.
#[derive(Debug, thiserror::Error)]
pub enum RepsenseError {
    #[error("Catalog error: {message}")]
    Catalog { message: String },

    #[error("Processing error: {message}")]
    Processing { message: String },

    #[error("Session error: {message}")]
    Session { message: String },

    #[error("Formula error: {message}")]
    Formula { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias using RepsenseError.
pub type RepsenseResult<T> = Result<T, RepsenseError>;

impl RepsenseError {
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog {
            message: msg.into(),
        }
    }

    pub fn processing(msg: impl Into<String>) -> Self {
        Self::Processing {
            message: msg.into(),
        }
    }

    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session {
            message: msg.into(),
        }
    }

    pub fn formula(msg: impl Into<String>) -> Self {
        Self::Formula {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Classify a failed read of `path`.
    pub fn read(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => Self::Io(err),
        }
    }
}

/// Read a whole file, mapping a missing file to [`RepsenseError::FileNotFound`].
pub fn read_to_string(path: &Path) -> RepsenseResult<String> {
    std::fs::read_to_string(path).map_err(|e| RepsenseError::read(path, e))
}
