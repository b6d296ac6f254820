//! Observability setup for tfconnect: structured logging with optional
//! OpenTelemetry trace export.

pub mod tracing_setup;
