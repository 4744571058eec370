//! Screen configuration.

use shared_bus::{EchoGuardConfig, EchoStrategy, EventFilter};
use std::env;
use tracing::warn;

/// Configuration for one screen.
#[derive(Debug, Clone)]
pub struct ScreenConfig {
    /// Name used in logs and as the bus subscriber label.
    pub name: String,

    /// Echo suppression settings.
    pub echo: EchoGuardConfig,

    /// Which event topics the screen subscribes to.
    pub filter: EventFilter,
}

impl ScreenConfig {
    /// Defaults: correlated echo guard, all topics.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            echo: EchoGuardConfig::default(),
            filter: EventFilter::all(),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CF_ECHO_STRATEGY`: `correlated` or `next_delivery` (default: correlated)
    /// - `CF_ECHO_CAPACITY`: outstanding origin ids kept (default: 64)
    /// - `CF_ECHO_TTL_SECS`: lifetime of an unclaimed origin id (default: 120,
    ///   minimum: 1)
    ///
    /// Unparseable values fall back to the default with a warning.
    pub fn from_env(name: impl Into<String>) -> Self {
        let mut config = Self::new(name);

        if let Ok(raw) = env::var("CF_ECHO_STRATEGY") {
            match raw.parse::<EchoStrategy>() {
                Ok(strategy) => config.echo.strategy = strategy,
                Err(e) => warn!(screen = %config.name, error = %e, "Ignoring CF_ECHO_STRATEGY"),
            }
        }
        if let Some(capacity) = parse_var("CF_ECHO_CAPACITY", &config.name) {
            config.echo.capacity = capacity;
        }
        if let Some(ttl) = parse_var::<u64>("CF_ECHO_TTL_SECS", &config.name) {
            if ttl < EchoGuardConfig::MIN_TTL_SECS {
                warn!(screen = %config.name, ttl, "CF_ECHO_TTL_SECS below minimum, raising");
            }
            config.echo.ttl_secs = ttl.max(EchoGuardConfig::MIN_TTL_SECS);
        }

        config
    }

    #[must_use]
    pub fn with_echo(mut self, echo: EchoGuardConfig) -> Self {
        self.echo = echo;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: EventFilter) -> Self {
        self.filter = filter;
        self
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, screen: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(screen, key, value = %raw, "Ignoring unparseable setting");
            None
        }
    }
}
