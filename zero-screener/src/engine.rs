//! Screening engine.
//!
//! Hands a validated [`ScreeningRequest`] to a [`StockScreener`] and returns
//! whatever frame it produces, logging the run on the way.

use std::time::Instant;

use serde_json::json;
use tracing::{error, info};
use zero_common::log_error;
use zero_common::logging::{LifecycleEventType, RunContext};

use crate::error::{Result, ScreenError};
use crate::frame::ResultFrame;
use crate::request::ScreeningRequest;
use crate::screener::StockScreener;

/// Run one screen.
///
/// The frame is returned as produced; an empty frame is a valid result. Any
/// collaborator failure surfaces as [`ScreenError::Screening`] with the
/// original error kept as its source.
pub fn run_screening<S>(
    screener: &S,
    request: &ScreeningRequest,
    ctx: &RunContext,
) -> Result<ResultFrame>
where
    S: StockScreener + ?Sized,
{
    let span = ctx.span("screening");
    let _guard = span.enter();

    let preset = request.preset;
    info!(
        preset = preset.name(),
        label = preset.label(),
        "Screening with preset: {}",
        preset.description()
    );
    info!(
        top_n = request.top_n,
        min_score = request.min_score,
        pool = request.stock_pool.as_ref().map_or(0, Vec::len),
        parallel = request.parallel,
        max_workers = request.max_workers,
        "Screening parameters"
    );

    ctx.log_event(
        LifecycleEventType::ExternalCall,
        json!({
            "screener": screener.name(),
            "preset": preset.name(),
            "top_n": request.top_n,
            "min_score": request.min_score,
        }),
    );

    let started = Instant::now();
    let frame = screener
        .screen(
            request.stock_pool.as_deref(),
            preset,
            request.top_n,
            request.min_score,
            request.parallel,
            request.max_workers,
        )
        .map_err(|e| {
            error!(screener = screener.name(), error = %e, "Screener failed");
            let err = ScreenError::screening(e);
            log_error!(ctx, err, "screener": screener.name());
            err
        })?;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    ctx.log_event(
        LifecycleEventType::ExternalCallResult,
        json!({
            "screener": screener.name(),
            "rows": frame.len(),
            "duration_ms": elapsed_ms,
        }),
    );
    info!(rows = frame.len(), elapsed_ms, "Screening finished");

    Ok(frame)
}
