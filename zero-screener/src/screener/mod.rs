//! Screener collaborator abstraction.
//!
//! The pipeline only knows the [`StockScreener`] trait: it hands over the
//! validated parameters and receives a [`ResultFrame`]. How candidates are
//! scored, and whether that happens on several threads, is up to the
//! implementation.
//!
//! [`SnapshotScreener`] is the bundled implementation; it ranks a pre-scored
//! universe snapshot on disk.

pub mod snapshot;

use std::path::PathBuf;
use thiserror::Error;

use crate::frame::ResultFrame;
use crate::preset::Preset;

pub use snapshot::{SnapshotScreener, SnapshotStock, UniverseSnapshot};

// ============================================================================
// Screener Error
// ============================================================================

/// Errors raised by screener implementations.
#[derive(Debug, Error)]
pub enum ScreenerError {
    /// Input data for the screen could not be found
    #[error("Data not available: {0}")]
    DataNotAvailable(String),

    /// Reading input data failed
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input data was malformed
    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The screener cannot run right now
    #[error("Screener unavailable: {0}")]
    Unavailable(String),

    /// Internal screener error
    #[error("Internal error: {0}")]
    Internal(String),
}

// ============================================================================
// Stock Screener Trait
// ============================================================================

/// A component that ranks stocks for a preset.
pub trait StockScreener: Send + Sync {
    /// Screener name for logging (e.g., "snapshot")
    fn name(&self) -> &'static str;

    /// Run a screen.
    ///
    /// # Arguments
    /// * `stock_pool` - Codes to consider; `None` means the whole market
    /// * `preset` - Strategy to apply
    /// * `top_n` - Maximum rows to return
    /// * `min_score` - Composite score floor
    /// * `parallel` - Whether the screener may score candidates concurrently
    /// * `max_workers` - Upper bound on concurrent workers
    ///
    /// Rows come back sorted by composite score, best first.
    fn screen(
        &self,
        stock_pool: Option<&[String]>,
        preset: Preset,
        top_n: usize,
        min_score: f64,
        parallel: bool,
        max_workers: usize,
    ) -> Result<ResultFrame, ScreenerError>;
}
