//! Errors raised while building or loading model data.

use std::path::PathBuf;

/// Errors that can occur when working with model data.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Dimension mismatch: {message}")]
    DimensionMismatch { message: String },

    #[error("Invalid value: {message}")]
    InvalidValue { message: String },
}

impl ModelError {
    pub fn dimension(msg: impl Into<String>) -> Self {
        Self::DimensionMismatch {
            message: msg.into(),
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidValue {
            message: msg.into(),
        }
    }
}
