//! # Change Publisher
//!
//! Defines the publishing side of the change bus.
//!
//! Publishing is a synchronous fan-out: `publish` returns only after every
//! matching subscriber has handled the delivery. The registry is snapshotted
//! at the start of each publish, so subscriptions may be added or dropped
//! from inside a delivery without disturbing the iteration.

use crate::envelope::ChangeEnvelope;
use crate::events::{ChangeEvent, EventFilter};
use crate::subscriber::{ChangeSubscriber, Delivery, Subscription, SubscriptionId};
use feed_telemetry::{BUS_DELIVERIES, BUS_EVENTS_PUBLISHED, BUS_SUBSCRIBERS};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};
use tracing::{debug, error, info, warn};

/// Trait for publishing changes to the bus.
pub trait ChangePublisher: Send + Sync {
    /// Publish an event under a fresh origin id.
    fn publish(&self, event: ChangeEvent) -> PublishReport {
        self.publish_envelope(ChangeEnvelope::new(event))
    }

    /// Publish an already wrapped event, keeping its origin id.
    fn publish_envelope(&self, envelope: ChangeEnvelope) -> PublishReport;

    /// Get the total number of events published.
    fn events_published(&self) -> u64;
}

/// Per-publish delivery accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Subscribers whose filter matched and that were invoked.
    pub receivers: usize,
    /// Deliveries that changed a cache.
    pub applied: usize,
    /// Deliveries skipped as the subscriber's own echo.
    pub echoes: usize,
    /// Deliveries the subscriber had nothing to apply to.
    pub ignored: usize,
    /// Deliveries excluded by the subscriber's filter.
    pub filtered: usize,
    /// Deliveries that errored or panicked.
    pub failed: usize,
}

struct Entry {
    id: SubscriptionId,
    filter: EventFilter,
    subscriber: Weak<dyn ChangeSubscriber>,
    label: String,
}

/// Registration table shared between the bus and its subscription handles.
#[derive(Default)]
pub(crate) struct Registry {
    next_id: u64,
    entries: Vec<Entry>,
}

impl Registry {
    pub(crate) fn contains(&self, id: SubscriptionId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) {
        self.entries.retain(|entry| entry.id != id);
        BUS_SUBSCRIBERS.set(self.entries.len() as f64);
    }

    fn snapshot(&self) -> Vec<(SubscriptionId, EventFilter, Weak<dyn ChangeSubscriber>, String)> {
        self.entries
            .iter()
            .map(|entry| {
                (
                    entry.id,
                    entry.filter.clone(),
                    entry.subscriber.clone(),
                    entry.label.clone(),
                )
            })
            .collect()
    }
}

/// In-process change bus.
///
/// Constructed explicitly and passed to each screen; there is no global
/// instance. Subscribers are held weakly, so a screen that is dropped without
/// unsubscribing simply stops receiving and is pruned on the next publish.
pub struct ChangeBus {
    /// Registered subscribers, in subscription order.
    registry: Arc<RwLock<Registry>>,

    /// Total events published.
    events_published: AtomicU64,
}

impl ChangeBus {
    /// Create a new bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Arc::new(RwLock::new(Registry::default())),
            events_published: AtomicU64::new(0),
        }
    }

    /// Subscribe to events matching a filter.
    ///
    /// Only events published after this call are delivered. Returns a
    /// `Subscription` handle; dropping it unsubscribes.
    #[must_use]
    pub fn subscribe<S>(&self, subscriber: Arc<S>, filter: EventFilter) -> Subscription
    where
        S: ChangeSubscriber + 'static,
    {
        let label = subscriber.label().to_string();
        let strong: Arc<dyn ChangeSubscriber> = subscriber;
        let weak: Weak<dyn ChangeSubscriber> = Arc::downgrade(&strong);

        let id = match self.registry.write() {
            Ok(mut registry) => {
                registry.next_id += 1;
                let id = SubscriptionId(registry.next_id);
                registry.entries.push(Entry {
                    id,
                    filter: filter.clone(),
                    subscriber: weak,
                    label: label.clone(),
                });
                BUS_SUBSCRIBERS.set(registry.entries.len() as f64);
                id
            }
            Err(_) => {
                error!(subscriber = %label, "Bus registry poisoned; subscription not registered");
                SubscriptionId(0)
            }
        };

        info!(subscriber = %label, id = id.0, topics = ?filter.topics, "New subscription created");

        Subscription::new(id, Arc::downgrade(&self.registry), label)
    }

    /// Get the number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.registry
            .read()
            .map(|registry| registry.entries.len())
            .unwrap_or(0)
    }

    fn prune_dead(&self) {
        if let Ok(mut registry) = self.registry.write() {
            let before = registry.entries.len();
            registry
                .entries
                .retain(|entry| entry.subscriber.strong_count() > 0);
            let pruned = before - registry.entries.len();
            if pruned > 0 {
                debug!(pruned, "Pruned dropped subscribers");
                BUS_SUBSCRIBERS.set(registry.entries.len() as f64);
            }
        }
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangePublisher for ChangeBus {
    fn publish_envelope(&self, envelope: ChangeEnvelope) -> PublishReport {
        let kind = envelope.event.kind();

        // Always increment counter (event was attempted)
        self.events_published.fetch_add(1, Ordering::Relaxed);
        BUS_EVENTS_PUBLISHED.with_label_values(&[kind]).inc();

        let snapshot = match self.registry.read() {
            Ok(registry) => registry.snapshot(),
            Err(_) => {
                error!(kind, "Bus registry poisoned; event dropped");
                return PublishReport::default();
            }
        };

        let mut report = PublishReport::default();
        let mut saw_dead = false;

        for (id, filter, weak, label) in snapshot {
            let Some(subscriber) = weak.upgrade() else {
                saw_dead = true;
                continue;
            };

            if !filter.matches(&envelope.event) {
                report.filtered += 1;
                BUS_DELIVERIES.with_label_values(&[kind, "filtered"]).inc();
                continue;
            }

            report.receivers += 1;
            let outcome = catch_unwind(AssertUnwindSafe(|| subscriber.on_change(&envelope)));

            let label_value = match outcome {
                Ok(Ok(Delivery::Applied)) => {
                    report.applied += 1;
                    "applied"
                }
                Ok(Ok(Delivery::Echo)) => {
                    report.echoes += 1;
                    "echo"
                }
                Ok(Ok(Delivery::Ignored)) => {
                    report.ignored += 1;
                    "ignored"
                }
                Ok(Err(e)) => {
                    report.failed += 1;
                    warn!(
                        subscriber = %label,
                        id = id.0,
                        kind,
                        entity = %envelope.event.subject_id(),
                        error = %e,
                        "Subscriber failed to apply change"
                    );
                    "failed"
                }
                Err(_) => {
                    report.failed += 1;
                    error!(
                        subscriber = %label,
                        id = id.0,
                        kind,
                        entity = %envelope.event.subject_id(),
                        "Subscriber panicked while applying change"
                    );
                    "failed"
                }
            };
            BUS_DELIVERIES.with_label_values(&[kind, label_value]).inc();
        }

        if saw_dead {
            self.prune_dead();
        }

        debug!(
            kind,
            origin = %envelope.origin_id,
            entity = %envelope.event.subject_id(),
            receivers = report.receivers,
            applied = report.applied,
            echoes = report.echoes,
            failed = report.failed,
            "Change published"
        );

        report
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
