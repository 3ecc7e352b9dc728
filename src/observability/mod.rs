//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → tracing.rs (spans with propagated trace context)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Span exporter (finished spans, one trace per end-to-end request)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - No process-wide tracer: a `Telemetry` value is built at startup and
//!   handed to every handler and client that needs it
//! - W3C Trace Context headers carry the trace across the service hop

pub mod logging;
pub mod tracing;

pub use self::tracing::{LogSpanExporter, Telemetry, TraceCarrier, W3cTraceCarrier};
