//! Structured logging setup.
//!
//! Log lines carry consistent fields so they can be filtered per screen:
//! - `screen`: name of the screen that logged
//! - `kind`: change kind (like, bookmark, comment, ...)
//! - `entity`: id of the entity concerned
//! - Additional context fields

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::{TelemetryConfig, TelemetryError};

/// Install the global `tracing` subscriber.
///
/// Uses `RUST_LOG` if set, otherwise the configured level. Fails if a global
/// subscriber is already installed.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    let fmt_layer = if !config.console_output {
        None
    } else if config.json_logs {
        // JSON output for containers/production
        Some(
            tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .boxed(),
        )
    } else {
        // Pretty output for development
        Some(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(true)
                .boxed(),
        )
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Logging initialized"
    );

    Ok(())
}

/// Install a test-friendly subscriber, ignoring "already installed" errors.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Log a change-related event with standard fields.
#[macro_export]
macro_rules! log_change {
    ($level:ident, $screen:expr, $msg:expr, $kind:expr, $entity:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            screen = %$screen,
            kind = $kind,
            entity = %$entity,
            $($($field)*,)?
            $msg
        )
    };
}
