//! Error types shared across SwingCheck crates.

use std::path::PathBuf;

/// Top-level error type for SwingCheck operations.
#[derive(Debug, thiserror::Error)]
pub enum SwingError {
    #[error("Decode error: {message}")]
    Decode { message: String },

    #[error("Analysis error: {message}")]
    Analysis { message: String },

    #[error("Input error: {message}")]
    Input { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using SwingError.
pub type SwingResult<T> = Result<T, SwingError>;

impl SwingError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode {
            message: msg.into(),
        }
    }

    pub fn analysis(msg: impl Into<String>) -> Self {
        Self::Analysis {
            message: msg.into(),
        }
    }

    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}
