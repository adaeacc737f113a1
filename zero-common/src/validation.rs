//! Validation primitives shared by the Zero screening tools.
//!
//! Provides the [`ValidationError`] taxonomy used for every user-facing input
//! check, the [`Validate`] trait, and validation of the loaded configuration.

use std::fmt::Display;
use thiserror::Error;

use crate::config::{Config, ObservabilityConfig, ScreenerConfig};

/// Validation error for configuration and user input.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid {field}: {value} (must be between {min} and {max})")]
    OutOfRange {
        field: String,
        value: String,
        min: String,
        max: String,
    },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid output path {path}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    /// Build an out-of-range error from any displayable bounds.
    pub fn out_of_range(
        field: impl Into<String>,
        value: impl Display,
        min: impl Display,
        max: impl Display,
    ) -> Self {
        Self::OutOfRange {
            field: field.into(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }

    /// Name of the offending field, when the error carries one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::OutOfRange { field, .. }
            | Self::MissingField { field }
            | Self::InvalidValue { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections and requests.
pub trait Validate {
    /// Validate this value.
    fn validate(&self) -> ValidationResult<()>;
}

/// Check that `value` lies in the closed range `[min, max]`.
pub fn ensure_in_range<T>(field: &str, value: T, min: T, max: T) -> ValidationResult<T>
where
    T: PartialOrd + Display + Copy,
{
    // NaN compares false on both sides, so it is rejected here too.
    if value >= min && value <= max {
        Ok(value)
    } else {
        Err(ValidationError::out_of_range(field, value, min, max))
    }
}

/// Collapse a list of errors into a single result.
pub fn collect_errors(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
    if errors.is_empty() {
        Ok(())
    } else if errors.len() == 1 {
        Err(errors.remove(0))
    } else {
        Err(ValidationError::Multiple(errors))
    }
}

impl Config {
    /// Validate the entire configuration.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = self.observability.validate() {
            errors.push(e);
        }

        if let Err(e) = self.screener.validate() {
            errors.push(e);
        }

        collect_errors(errors)
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_level".into(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.log_format.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            });
        }

        Ok(())
    }
}

impl Validate for ScreenerConfig {
    fn validate(&self) -> ValidationResult<()> {
        if let Some(ref path) = self.snapshot_path {
            if path.trim().is_empty() {
                return Err(ValidationError::InvalidValue {
                    field: "screener.snapshot_path".into(),
                    reason: "must not be empty when set".into(),
                });
            }
        }

        for (i, dir) in self.extra_output_dirs.iter().enumerate() {
            if dir.trim().is_empty() {
                return Err(ValidationError::InvalidValue {
                    field: format!("screener.extra_output_dirs[{i}]"),
                    reason: "must not be empty".into(),
                });
            }
        }

        Ok(())
    }
}
