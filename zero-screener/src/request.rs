//! Screening requests.
//!
//! [`ScreeningParams`] holds raw caller input (CLI flags, config). Calling
//! [`ScreeningParams::validate`] turns it into a [`ScreeningRequest`], which is
//! what the engine accepts.

use serde::{Deserialize, Serialize};
use zero_common::validation::{Validate, ValidationError, ValidationResult};

use crate::preset::Preset;
use crate::validation::{
    validate_max_workers, validate_min_score, validate_stock_pool, validate_top_n,
    DEFAULT_MAX_WORKERS, DEFAULT_MIN_SCORE, DEFAULT_TOP_N,
};

// ============================================================================
// Raw Parameters
// ============================================================================

/// Unvalidated screening parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningParams {
    /// Preset identifier
    pub preset: String,
    /// Maximum number of results
    pub top_n: i64,
    /// Composite score floor
    pub min_score: f64,
    /// Optional explicit instrument pool
    pub stock_pool: Option<Vec<String>>,
    /// Whether the screener may work concurrently
    pub parallel: bool,
    /// Concurrent worker cap
    pub max_workers: i64,
}

impl ScreeningParams {
    /// Parameters for `preset` with every other field at its default.
    pub fn new(preset: impl Into<String>) -> Self {
        Self {
            preset: preset.into(),
            top_n: DEFAULT_TOP_N,
            min_score: DEFAULT_MIN_SCORE,
            stock_pool: None,
            parallel: true,
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }

    /// Check every parameter and build a request.
    ///
    /// Checks run in a fixed order (preset, top_n, min_score, max_workers,
    /// stock_pool) and stop at the first failure.
    pub fn validate(&self) -> ValidationResult<ScreeningRequest> {
        let preset: Preset = self
            .preset
            .parse()
            .map_err(|_| ValidationError::InvalidValue {
                field: "preset".into(),
                reason: format!(
                    "unknown preset '{}' (available: {})",
                    self.preset,
                    Preset::available()
                ),
            })?;
        let top_n = validate_top_n(self.top_n)?;
        let min_score = validate_min_score(self.min_score)?;
        let max_workers = validate_max_workers(self.max_workers)?;
        validate_stock_pool(self.stock_pool.as_deref())?;

        Ok(ScreeningRequest {
            preset,
            top_n,
            min_score,
            stock_pool: self.stock_pool.clone(),
            parallel: self.parallel,
            max_workers,
        })
    }
}

// ============================================================================
// Validated Request
// ============================================================================

/// A screening request ready to hand to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningRequest {
    pub preset: Preset,
    pub top_n: usize,
    pub min_score: f64,
    /// `None` means the whole market
    pub stock_pool: Option<Vec<String>>,
    pub parallel: bool,
    pub max_workers: usize,
}

impl ScreeningRequest {
    /// Request for `preset` with default limits.
    pub fn new(preset: Preset) -> Self {
        Self {
            preset,
            top_n: DEFAULT_TOP_N as usize,
            min_score: DEFAULT_MIN_SCORE,
            stock_pool: None,
            parallel: true,
            max_workers: DEFAULT_MAX_WORKERS as usize,
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn with_stock_pool(mut self, stock_pool: Vec<String>) -> Self {
        self.stock_pool = Some(stock_pool);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }
}

impl Validate for ScreeningRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_top_n(i64::try_from(self.top_n).unwrap_or(i64::MAX))?;
        validate_min_score(self.min_score)?;
        validate_max_workers(i64::try_from(self.max_workers).unwrap_or(i64::MAX))?;
        validate_stock_pool(self.stock_pool.as_deref())
    }
}
