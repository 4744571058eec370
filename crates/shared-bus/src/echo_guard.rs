//! # Echo Guard
//!
//! Lets a screen skip the delivery of a change it published itself, since it
//! already applied that change optimistically before publishing.
//!
//! ## Strategies
//!
//! - **Correlated** (default): the screen registers the origin id of each
//!   publish. Only a delivery carrying a registered id is dropped; unrelated
//!   deliveries arriving in between pass through. Registered ids expire after
//!   a time window and the set is bounded in size.
//! - **NextDelivery**: a one-shot flag that swallows the next delivery of any
//!   kind. A second, unrelated change delivered before the echo is lost.

use crate::envelope::{ChangeEnvelope, OriginId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How the guard recognises an echo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EchoStrategy {
    /// Match deliveries on their origin id.
    #[default]
    Correlated,
    /// Treat the next delivery, whatever it is, as the echo.
    NextDelivery,
}

impl std::str::FromStr for EchoStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "correlated" => Ok(Self::Correlated),
            "next_delivery" | "next-delivery" => Ok(Self::NextDelivery),
            other => Err(format!("unknown echo strategy: {other}")),
        }
    }
}

/// Echo guard configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoGuardConfig {
    /// Recognition strategy.
    pub strategy: EchoStrategy,
    /// Maximum number of outstanding origin ids; oldest are evicted first.
    pub capacity: usize,
    /// Seconds after which an unclaimed origin id is forgotten. Values
    /// below `MIN_TTL_SECS` are raised to it.
    pub ttl_secs: u64,
}

impl EchoGuardConfig {
    /// Default bound on outstanding origin ids.
    pub const DEFAULT_CAPACITY: usize = 64;

    /// Default lifetime of an unclaimed origin id.
    pub const DEFAULT_TTL_SECS: u64 = 120;

    /// Shortest lifetime accepted. A zero lifetime would expire an origin id
    /// before its own delivery is checked.
    pub const MIN_TTL_SECS: u64 = 1;

    /// Small bounds for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            strategy: EchoStrategy::Correlated,
            capacity: 4,
            ttl_secs: 5,
        }
    }

    /// Lifetime of an unclaimed origin id, never below `MIN_TTL_SECS`.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs.max(Self::MIN_TTL_SECS))
    }

    /// The inherited one-shot behaviour.
    #[must_use]
    pub fn next_delivery() -> Self {
        Self {
            strategy: EchoStrategy::NextDelivery,
            ..Self::default()
        }
    }
}

impl Default for EchoGuardConfig {
    fn default() -> Self {
        Self {
            strategy: EchoStrategy::Correlated,
            capacity: Self::DEFAULT_CAPACITY,
            ttl_secs: Self::DEFAULT_TTL_SECS,
        }
    }
}

/// Outcome of checking a delivery against the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoVerdict {
    /// The delivery is this screen's own publish; skip it.
    Echo,
    /// The delivery must be reconciled.
    Foreign,
}

/// Per-screen echo suppression state.
#[derive(Debug)]
pub struct EchoGuard {
    config: EchoGuardConfig,

    /// Outstanding origin ids with the instant they were registered.
    expected: VecDeque<(OriginId, Instant)>,

    /// One-shot flag used by `EchoStrategy::NextDelivery`.
    armed: bool,
}

impl EchoGuard {
    /// Create a guard with the given configuration.
    #[must_use]
    pub fn new(mut config: EchoGuardConfig) -> Self {
        if config.ttl_secs < EchoGuardConfig::MIN_TTL_SECS {
            warn!(
                ttl_secs = config.ttl_secs,
                min = EchoGuardConfig::MIN_TTL_SECS,
                "Echo lifetime too short, raising to minimum"
            );
            config.ttl_secs = EchoGuardConfig::MIN_TTL_SECS;
        }
        Self {
            config,
            expected: VecDeque::new(),
            armed: false,
        }
    }

    /// The guard's configuration.
    #[must_use]
    pub fn config(&self) -> &EchoGuardConfig {
        &self.config
    }

    /// Arm the guard for a publish about to go out under `origin`.
    pub fn expect(&mut self, origin: OriginId) {
        self.expect_at(origin, Instant::now());
    }

    /// Check a delivery, consuming the matching expectation if it is an echo.
    pub fn check(&mut self, envelope: &ChangeEnvelope) -> EchoVerdict {
        self.check_at(envelope, Instant::now())
    }

    /// Drop the expectation for `origin` if it is still outstanding.
    ///
    /// Publishing is synchronous, so once `publish` has returned an echo that
    /// has not arrived never will (for example, the screen's filter excluded
    /// it). Only affects the correlated strategy.
    pub fn forget(&mut self, origin: OriginId) -> bool {
        let before = self.expected.len();
        self.expected.retain(|(id, _)| *id != origin);
        before != self.expected.len()
    }

    /// Number of echoes still expected.
    #[must_use]
    pub fn pending(&self) -> usize {
        match self.config.strategy {
            EchoStrategy::Correlated => self.expected.len(),
            EchoStrategy::NextDelivery => usize::from(self.armed),
        }
    }

    /// Check whether any echo is outstanding.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }

    pub(crate) fn expect_at(&mut self, origin: OriginId, now: Instant) {
        match self.config.strategy {
            EchoStrategy::NextDelivery => self.armed = true,
            EchoStrategy::Correlated => {
                self.garbage_collect(now);
                while self.expected.len() >= self.config.capacity.max(1) {
                    if let Some((evicted, _)) = self.expected.pop_front() {
                        debug!(origin = %evicted, "Echo expectation evicted (capacity)");
                    }
                }
                self.expected.push_back((origin, now));
            }
        }
    }

    pub(crate) fn check_at(&mut self, envelope: &ChangeEnvelope, now: Instant) -> EchoVerdict {
        match self.config.strategy {
            EchoStrategy::NextDelivery => {
                if self.armed {
                    self.armed = false;
                    EchoVerdict::Echo
                } else {
                    EchoVerdict::Foreign
                }
            }
            EchoStrategy::Correlated => {
                self.garbage_collect(now);
                match self
                    .expected
                    .iter()
                    .position(|(id, _)| *id == envelope.origin_id)
                {
                    Some(index) => {
                        self.expected.remove(index);
                        EchoVerdict::Echo
                    }
                    None => EchoVerdict::Foreign,
                }
            }
        }
    }

    /// Remove expectations that have lived for the full lifetime.
    fn garbage_collect(&mut self, now: Instant) {
        let ttl = self.config.ttl();
        self.expected
            .retain(|&(_, registered)| now.saturating_duration_since(registered) < ttl);
    }
}

impl Default for EchoGuard {
    fn default() -> Self {
        Self::new(EchoGuardConfig::default())
    }
}
