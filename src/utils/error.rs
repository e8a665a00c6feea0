use crate::domain::model::Stage;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    /// An expected page element is missing or malformed; the remote layout
    /// no longer matches what the scraper was written against.
    #[error("Structural mismatch at {stage} level: {detail}")]
    StructuralMismatch { stage: Stage, detail: String },

    #[error("Navigation to {url} failed: {reason}")]
    NavigationFailure { url: String, reason: String },

    #[error("Timed out after {after:?} waiting for {what}")]
    Timeout { what: String, after: Duration },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Cycle cancelled by shutdown request")]
    Cancelled,
}

impl ScrapeError {
    pub fn mismatch(stage: Stage, detail: impl Into<String>) -> Self {
        Self::StructuralMismatch {
            stage,
            detail: detail.into(),
        }
    }

    /// Failures that only cost the current page visit. Everything else
    /// (IO, config, cancellation) is handled by the caller differently.
    pub fn is_page_failure(&self) -> bool {
        matches!(
            self,
            Self::StructuralMismatch { .. }
                | Self::NavigationFailure { .. }
                | Self::Timeout { .. }
                | Self::Browser(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
