//! Result evaluation engine for directory-service health checks.
//!
//! The [`evaluation`] module turns already-collected check output into
//! `Pass`/`Warning`/`Fail` verdicts with structured issues. The remaining
//! modules carry the service shell around it.

pub mod config;
pub mod error;
pub mod evaluation;
pub mod telemetry;

pub use error::AppError;
