//! Logging setup for designfirst.
//!
//! This crate provides:
//! - Structured JSON or pretty logging on stderr, filtered by level
//! - Standard event names and macros for compiler milestones
//!
//! # Usage
//!
//! ```ignore
//! use designfirst_telemetry::{LogFormat, TelemetryConfig};
//!
//! let config = TelemetryConfig::new()
//!     .with_log_level("debug")
//!     .with_log_format(LogFormat::Pretty);
//!
//! designfirst_telemetry::init(&config)?;
//! ```

pub mod config;
pub mod logging;

pub use config::{LogFormat, TelemetryConfig};
pub use logging::{events, init_logging};

use thiserror::Error;

/// Telemetry errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize logging.
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
}

/// Initialize logging with the given configuration.
///
/// Fails if a global subscriber is already installed.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    init_logging(config)?;
    tracing::debug!(
        service = %config.service_name,
        level = %config.log_level,
        format = config.log_format.as_str(),
        "logging initialized"
    );
    Ok(())
}
