//! Error types.
//!
//! Only conditions that abort the whole run are errors. Per-symbol outcomes
//! that merely remove a candidate are modelled by [`crate::symbol::SkipReason`].

use std::path::PathBuf;
use thiserror::Error;

/// Fatal error raised while preparing or running a smash.
#[derive(Debug, Error)]
pub enum PadError {
    /// Required input missing or empty.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Target image or its map file could not be read, or the output could not be written.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Image header does not look like a PE image.
    #[error("invalid PE header field {field}: {reason}")]
    Format { field: &'static str, reason: String },
}

impl PadError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PadError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn format(field: &'static str, reason: impl ToString) -> Self {
        PadError::Format {
            field,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PadError>;
