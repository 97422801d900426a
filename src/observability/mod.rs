//! Observability for query runs
//!
//! Structured logging with run and handler spans, plus in-process metrics on
//! routing decisions, fallbacks and failures.

pub mod logging;
pub mod metrics;

pub use logging::{init_default_logging, init_logging, LogFormat};
pub use metrics::{metrics, MetricsCollector, MetricsSnapshot};

// Span macros for structured logging
pub use logging::{handler_span, run_span};
