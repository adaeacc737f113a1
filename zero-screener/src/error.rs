//! Error types for the batch screener.

use thiserror::Error;
use zero_common::ValidationError;

use crate::screener::ScreenerError;

/// Result type alias for screener pipeline operations.
pub type Result<T> = std::result::Result<T, ScreenError>;

/// Boxed cause attached to export failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by the screening pipeline.
///
/// `Validation` and `MissingColumns` are input errors; `Screening` and
/// `Export` are execution failures that keep the original cause as source.
#[derive(Debug, Error)]
pub enum ScreenError {
    /// A request parameter or output path failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The result set lacks columns the table needs
    #[error(
        "Result set is missing required columns: {} (required: {})",
        .missing.join(", "),
        .required.join(", ")
    )]
    MissingColumns {
        missing: Vec<String>,
        required: Vec<String>,
    },

    /// The screener collaborator failed
    #[error("Screening failed: {message}")]
    Screening {
        message: String,
        #[source]
        source: ScreenerError,
    },

    /// Writing the export file failed
    #[error("Export failed: {message}")]
    Export {
        message: String,
        #[source]
        source: BoxError,
    },
}

impl ScreenError {
    /// Wrap a collaborator failure.
    pub fn screening(source: ScreenerError) -> Self {
        Self::Screening {
            message: source.to_string(),
            source,
        }
    }

    /// Wrap a write failure.
    pub fn export(source: impl Into<BoxError>) -> Self {
        let source = source.into();
        Self::Export {
            message: source.to_string(),
            source,
        }
    }

    /// Check if this is an input error (as opposed to an execution failure).
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::MissingColumns { .. })
    }
}
