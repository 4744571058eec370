//! # Feed Telemetry
//!
//! Logging and metrics for the Case-Feed change-propagation core.
//!
//! ## Components
//!
//! - **Logs**: `tracing` events rendered by `tracing-subscriber` (pretty or JSON)
//! - **Metrics**: Prometheus counters for bus traffic and screen mutations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use feed_telemetry::{TelemetryConfig, init_telemetry};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_telemetry(config).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CF_SERVICE_NAME` | `case-feed` | Service name in logs |
//! | `CF_LOG_LEVEL` | `info` | Log level filter (`RUST_LOG` also honoured) |
//! | `CF_CONSOLE_OUTPUT` | `true` | Write logs to the console |
//! | `CF_JSON_LOGS` | `false` | JSON log lines |

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::{init_logging, init_test_logging};
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, BUS_DELIVERIES, BUS_EVENTS_PUBLISHED,
    BUS_SUBSCRIBERS, GATEWAY_FAILURES, SCREEN_MUTATIONS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    // Initialize metrics first
    let metrics_handle = register_metrics()?;

    logging::init_logging(&config)?;

    Ok(TelemetryGuard {
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}
