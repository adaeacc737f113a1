//! Zero Common - Shared types, utilities, and configuration for the Zero screening tools.
//!
//! This crate provides:
//! - Configuration types and loading
//! - Validation errors and the `Validate` trait
//! - Error types and handling utilities
//! - Logging setup and run-scoped logging context
//! - Small text helpers used by report rendering

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;
pub mod util;
pub mod validation;

pub use config::{Config, ObservabilityConfig, ScreenerConfig};
pub use error::{Error, Result};
pub use validation::{Validate, ValidationError, ValidationResult};

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::config::{Config, ObservabilityConfig, ScreenerConfig};
    pub use crate::error::{Error, Result, ResultExt};
    pub use crate::logging::{init_logging, RunContext};
    pub use crate::validation::{Validate, ValidationError, ValidationResult};
}
