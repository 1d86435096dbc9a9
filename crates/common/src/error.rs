//! Error types shared across ClipForge crates.
//!
//! Every failure the subsystem can produce maps onto one of these
//! variants; operation boundaries turn them into structured responses
//! rather than letting them escape as panics.

use std::path::PathBuf;

/// Top-level error type for ClipForge operations.
#[derive(Debug, thiserror::Error)]
pub enum ForgeError {
    /// Malformed input, e.g. an empty operation batch.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Missing project, export, video, or job.
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Caller does not own the project.
    #[error("Authorization error: {message}")]
    Authorization { message: String },

    /// GC action attempted on a pinned export.
    #[error("Export is pinned: {message}")]
    Pinned { message: String },

    /// Version-log gap detected during replay.
    #[error("Integrity error: {message}")]
    Integrity { message: String },

    /// Underlying media processing failed.
    #[error("Render error: {message}")]
    Render { message: String },

    /// Destructive operation attempted without the explicit confirmation flag.
    #[error("Confirmation required: {message}")]
    ConfirmationRequired { message: String },

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

/// Result type alias using ForgeError.
pub type ForgeResult<T> = Result<T, ForgeError>;

impl ForgeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound {
            message: msg.into(),
        }
    }

    pub fn authorization(msg: impl Into<String>) -> Self {
        Self::Authorization {
            message: msg.into(),
        }
    }

    pub fn pinned(msg: impl Into<String>) -> Self {
        Self::Pinned {
            message: msg.into(),
        }
    }

    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::Integrity {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn confirmation_required(msg: impl Into<String>) -> Self {
        Self::ConfirmationRequired {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether this error is the pinned-export safety refusal.
    pub fn is_pinned(&self) -> bool {
        matches!(self, Self::Pinned { .. })
    }

    /// Whether this error is a not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::FileNotFound { .. })
    }
}
