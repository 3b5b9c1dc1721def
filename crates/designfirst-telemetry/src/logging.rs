//! Structured logging with JSON or pretty output.
//!
//! Logs go to stderr so compiled output on stdout stays machine-readable.

use crate::{LogFormat, TelemetryConfig, TelemetryError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the logging subsystem.
///
/// Sets up tracing-subscriber with either JSON or pretty format,
/// respecting the configured log level.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    // Build the env filter from config or RUST_LOG
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => init_json_logging(filter),
        LogFormat::Pretty => init_pretty_logging(filter),
    }
}

fn init_json_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let json_layer = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_file(false)
        .with_line_number(false)
        .flatten_event(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

fn init_pretty_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let pretty_layer = fmt::layer()
        .pretty()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(pretty_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

/// Standard log event names.
pub mod events {
    /// A definition file has been parsed.
    pub const DEFINITION_LOADED: &str = "definition_loaded";

    /// Routes have been compiled from the loaded definitions.
    pub const ROUTES_COMPILED: &str = "routes_compiled";

    /// Policies have been associated with controller actions.
    pub const POLICIES_REGISTERED: &str = "policies_registered";

    /// Compilation was aborted.
    pub const COMPILE_FAILED: &str = "compile_failed";
}

/// Helper macros for structured logging with standard fields.
///
/// These wrap the tracing macros to ensure consistent field naming.
#[macro_export]
macro_rules! log_definition_loaded {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::DEFINITION_LOADED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_routes_compiled {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::ROUTES_COMPILED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_policies_registered {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::POLICIES_REGISTERED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_compile_failed {
    ($($field:tt)*) => {
        tracing::error!(
            event = $crate::logging::events::COMPILE_FAILED,
            $($field)*
        )
    };
}
