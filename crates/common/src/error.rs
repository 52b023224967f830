//! Error types shared across Tagreel crates.

use std::path::PathBuf;

/// Top-level error type for Tagreel operations.
#[derive(Debug, thiserror::Error)]
pub enum TagreelError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Export busy: {message}")]
    Busy { message: String },

    #[error("Seek error: {message}")]
    Seek { message: String },

    #[error("Playback error: {message}")]
    Playback { message: String },

    #[error("Recorder error: {message}")]
    Recorder { message: String },

    #[error("Compositor error: {message}")]
    Compositor { message: String },

    #[error("Export error: {message}")]
    Export { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Job cancelled")]
    Cancelled,

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using TagreelError.
pub type TagreelResult<T> = Result<T, TagreelError>;

impl TagreelError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    pub fn busy(msg: impl Into<String>) -> Self {
        Self::Busy {
            message: msg.into(),
        }
    }

    pub fn seek(msg: impl Into<String>) -> Self {
        Self::Seek {
            message: msg.into(),
        }
    }

    pub fn playback(msg: impl Into<String>) -> Self {
        Self::Playback {
            message: msg.into(),
        }
    }

    pub fn recorder(msg: impl Into<String>) -> Self {
        Self::Recorder {
            message: msg.into(),
        }
    }

    pub fn compositor(msg: impl Into<String>) -> Self {
        Self::Compositor {
            message: msg.into(),
        }
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether the error came from a cancelled job rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
