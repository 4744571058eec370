//! Prometheus metrics for the change-propagation core.
//!
//! All metrics follow the naming convention: `cf_<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., events published)
//! - **Gauge**: Value that can go up or down (e.g., live subscribers)

use lazy_static::lazy_static;
use prometheus::{CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // CHANGE BUS METRICS
    // =========================================================================

    /// Events published on the change bus
    pub static ref BUS_EVENTS_PUBLISHED: CounterVec = CounterVec::new(
        Opts::new("cf_bus_events_published_total", "Change events published"),
        &["kind"]
    ).expect("metric creation failed");

    /// Deliveries by outcome
    pub static ref BUS_DELIVERIES: CounterVec = CounterVec::new(
        Opts::new("cf_bus_deliveries_total", "Change event deliveries by outcome"),
        &["kind", "outcome"]  // outcome: applied/echo/ignored/filtered/failed
    ).expect("metric creation failed");

    /// Registered subscribers
    pub static ref BUS_SUBSCRIBERS: Gauge = Gauge::new(
        "cf_bus_subscribers",
        "Number of subscriptions currently registered on the change bus"
    ).expect("metric creation failed");

    // =========================================================================
    // SCREEN METRICS
    // =========================================================================

    /// Mutations started by screens
    pub static ref SCREEN_MUTATIONS: CounterVec = CounterVec::new(
        Opts::new("cf_screen_mutations_total", "Mutations started by screens, by outcome"),
        &["kind", "outcome"]  // outcome: confirmed/rolled_back/left_inconsistent/rejected
    ).expect("metric creation failed");

    /// Remote gateway failures
    pub static ref GATEWAY_FAILURES: CounterVec = CounterVec::new(
        Opts::new("cf_gateway_failures_total", "Remote mutation failures by error"),
        &["kind", "error"]  // error: not_found/network/validation
    ).expect("metric creation failed");
}

/// Handle for the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Change bus
        Box::new(BUS_EVENTS_PUBLISHED.clone()),
        Box::new(BUS_DELIVERIES.clone()),
        Box::new(BUS_SUBSCRIBERS.clone()),
        // Screens
        Box::new(SCREEN_MUTATIONS.clone()),
        Box::new(GATEWAY_FAILURES.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            // Registering twice is harmless: the statics are shared
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
