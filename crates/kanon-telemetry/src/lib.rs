//! Observability for Kanon.
//!
//! - **Logging**: structured `tracing` output, JSON or pretty, filtered by
//!   `EnvFilter` directives
//! - **Metrics**: request and response contract failure counters through
//!   the `metrics` facade
//!
//! # Example
//!
//! ```rust,ignore
//! use kanon_telemetry::{init_logging, metrics, LogConfig};
//!
//! init_logging(&LogConfig::production())?;
//! metrics::describe_metrics();
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
