//! Logging utilities for the Zero screening tools.
//!
//! Log output always goes to stderr: stdout is reserved for the report
//! tables the command-line tools print.
//!
//! # Noise Filtering
//!
//! Extra targets can be pinned to `warn` through
//! `observability.excluded_targets`; `RUST_LOG` overrides everything.

use std::collections::HashMap;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::ObservabilityConfig;

/// Build the EnvFilter for the given base level and excluded targets.
fn build_filter(log_level: &str, excluded_targets: &[String]) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    EnvFilter::new(filter_directives(log_level, excluded_targets))
}

/// Directive string such as `info,rayon_core=warn`.
pub fn filter_directives(log_level: &str, excluded_targets: &[String]) -> String {
    let mut directives = String::from(log_level);
    for target in excluded_targets {
        directives.push_str(&format!(",{}=warn", target));
    }
    directives
}

/// Initialize logging with the given level and format.
///
/// * `log_level` - Base log level (trace, debug, info, warn, error)
/// * `log_format` - "json" for structured JSON, anything else for human-readable
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_logging(log_level: &str, log_format: &str) {
    init_logging_with_exclusions(log_level, log_format, &[]);
}

/// Initialize logging from the observability section of the config.
pub fn init_from_config(config: &ObservabilityConfig) {
    init_logging_with_exclusions(
        &config.log_level,
        &config.log_format,
        &config.excluded_targets,
    );
}

/// Whether `log_format` selects the JSON layer (case-insensitive).
fn is_json_format(log_format: &str) -> bool {
    log_format.trim().eq_ignore_ascii_case("json")
}

/// Initialize logging with custom excluded targets.
pub fn init_logging_with_exclusions(
    log_level: &str,
    log_format: &str,
    excluded_targets: &[String],
) {
    let filter = build_filter(log_level, excluded_targets);
    let subscriber = tracing_subscriber::registry().with(filter);

    if is_json_format(log_format) {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_span_events(FmtSpan::CLOSE)
            .with_current_span(true)
            .with_target(true)
            .with_file(true)
            .with_line_number(true);
        let _ = subscriber.with(fmt_layer).try_init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true)
            .with_file(false)
            .with_line_number(false);
        let _ = subscriber.with(fmt_layer).try_init();
    }

    tracing::debug!(
        log_level = %log_level,
        log_format = %log_format,
        excluded = excluded_targets.len(),
        "Logging initialized"
    );
}

/// Generate a new trace ID for a run.
pub fn generate_trace_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Generate a new span ID for step tracing.
pub fn generate_span_id() -> String {
    uuid::Uuid::new_v4().to_string()[..8].to_string()
}

// ============================================================================
// Run Context
// ============================================================================

/// Logging context for a single tool invocation.
///
/// Created once by the binary and handed down to the pipeline stages, which
/// attach it to their spans and lifecycle events.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Unique ID for the whole run
    pub trace_id: String,
    /// Current span ID
    pub span_id: String,
    /// Parent span ID (if any)
    pub parent_span_id: Option<String>,
    /// Tool name
    pub service: String,
    /// Additional key-value pairs attached to every lifecycle event
    pub baggage: HashMap<String, String>,
}

impl RunContext {
    /// Create a new run context.
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            trace_id: generate_trace_id(),
            span_id: generate_span_id(),
            parent_span_id: None,
            service: service.into(),
            baggage: HashMap::new(),
        }
    }

    /// Create a child span context.
    pub fn child_span(&self) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: generate_span_id(),
            parent_span_id: Some(self.span_id.clone()),
            service: self.service.clone(),
            baggage: self.baggage.clone(),
        }
    }

    /// Attach a baggage entry.
    pub fn with_baggage(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.baggage.insert(key.into(), value.into());
        self
    }

    /// Tracing span carrying this context's identifiers.
    pub fn span(&self, name: &'static str) -> tracing::Span {
        tracing::info_span!(
            "run",
            stage = name,
            trace_id = %self.trace_id,
            span_id = %self.span_id,
            service = %self.service,
        )
    }

    /// Log a lifecycle event with this context.
    pub fn log_event(&self, event_type: LifecycleEventType, payload: serde_json::Value) {
        let mut event = LifecycleEvent::with_context(
            &self.trace_id,
            &self.span_id,
            self.parent_span_id.clone(),
            &self.service,
            event_type,
            payload,
        );
        if !self.baggage.is_empty() {
            event.baggage = self.baggage.clone();
        }
        event.log();
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new("unknown")
    }
}

// ============================================================================
// Lifecycle Events
// ============================================================================

/// Structured log event for lifecycle tracking.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LifecycleEvent {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub trace_id: String,
    pub span_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,
    pub event_type: LifecycleEventType,
    pub service: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub baggage: HashMap<String, String>,
    pub payload: serde_json::Value,
}

/// Types of lifecycle events for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEventType {
    FunctionStart,
    FunctionEnd,
    Error,
    ExternalCall,
    ExternalCallResult,
    FileWrite,
}

impl LifecycleEvent {
    /// Create a new lifecycle event with full context.
    pub fn with_context(
        trace_id: impl Into<String>,
        span_id: impl Into<String>,
        parent_span_id: Option<String>,
        service: impl Into<String>,
        event_type: LifecycleEventType,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            timestamp: chrono::Utc::now(),
            trace_id: trace_id.into(),
            span_id: span_id.into(),
            parent_span_id,
            event_type,
            service: service.into(),
            baggage: HashMap::new(),
            payload,
        }
    }

    /// Emit this event as a flat JSON record on the `lifecycle` target.
    pub fn log(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            tracing::debug!(target: "lifecycle", "{json}");
        }
    }
}

// ============================================================================
// Logging Macros
// ============================================================================

/// Log a function entry with context.
#[macro_export]
macro_rules! log_entry {
    ($ctx:expr, $func:expr) => {
        $ctx.log_event(
            $crate::logging::LifecycleEventType::FunctionStart,
            serde_json::json!({ "function": $func }),
        );
    };
    ($ctx:expr, $func:expr, $($key:literal : $value:expr),* $(,)?) => {
        $ctx.log_event(
            $crate::logging::LifecycleEventType::FunctionStart,
            serde_json::json!({ "function": $func, $($key: $value),* }),
        );
    };
}

/// Log a function exit with context.
#[macro_export]
macro_rules! log_exit {
    ($ctx:expr, $func:expr) => {
        $ctx.log_event(
            $crate::logging::LifecycleEventType::FunctionEnd,
            serde_json::json!({ "function": $func }),
        );
    };
    ($ctx:expr, $func:expr, $($key:literal : $value:expr),* $(,)?) => {
        $ctx.log_event(
            $crate::logging::LifecycleEventType::FunctionEnd,
            serde_json::json!({ "function": $func, $($key: $value),* }),
        );
    };
}

/// Log an error with context.
#[macro_export]
macro_rules! log_error {
    ($ctx:expr, $error:expr) => {
        $ctx.log_event(
            $crate::logging::LifecycleEventType::Error,
            serde_json::json!({ "error": $error.to_string() }),
        );
    };
    ($ctx:expr, $error:expr, $($key:literal : $value:expr),* $(,)?) => {
        $ctx.log_event(
            $crate::logging::LifecycleEventType::Error,
            serde_json::json!({ "error": $error.to_string(), $($key: $value),* }),
        );
    };
}
