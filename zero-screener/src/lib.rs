//! Zero Screener Library
//!
//! Batch screening front end for A-shares: validates a screening request,
//! hands it to a [`StockScreener`], renders the ranked result table and
//! optionally exports it to CSV or a spreadsheet.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Validation  │──▶│    Engine     │──▶│    Report    │──▶│    Export    │
//! │ (request,    │   │ (RunContext,  │   │ (table,      │   │ (CSV + BOM,  │
//! │  path policy)│   │  screener)    │   │  stats)      │   │  xlsx)       │
//! └──────────────┘   └───────┬───────┘   └──────────────┘   └──────────────┘
//!                            │
//!                    ┌───────▼───────┐
//!                    │ StockScreener │  SnapshotScreener (bundled)
//!                    └───────────────┘
//! ```
//!
//! # Presets
//!
//! Eight fixed strategies, from `strong_momentum` to
//! `institutional_favorite`; see [`Preset`].

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod code;
pub mod engine;
pub mod error;
pub mod export;
pub mod frame;
pub mod preset;
pub mod report;
pub mod request;
pub mod screener;
pub mod validation;

pub use engine::run_screening;
pub use error::{Result, ScreenError};
pub use export::export_results;
pub use frame::{ResultFrame, ScreenedStock};
pub use preset::{is_valid_preset, Preset};
pub use report::{format_results_table, ScreeningStats};
pub use request::{ScreeningParams, ScreeningRequest};
pub use screener::{ScreenerError, SnapshotScreener, StockScreener};
pub use validation::{validate_output_path, OutputPathPolicy};
