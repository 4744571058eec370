//! Outbound (Driven) ports for a screen.
//!
//! These traits define what a screen needs from the outside: the remote
//! persistence service, somewhere to show alerts, and a renderer.

use crate::domain::{Alert, MutationRequest};
use async_trait::async_trait;
use shared_types::entities::Entity;
use shared_types::errors::GatewayError;

/// Remote persistence service.
///
/// Calls are at-most-once; the screen never retries. A call that never
/// completes leaves the optimistic local state in place.
#[async_trait]
pub trait MutationGateway: Send + Sync {
    /// Persist one mutation.
    ///
    /// # Errors
    /// - `NotFound`: the entity was deleted server-side
    /// - `Network`: transient transport failure
    /// - `Validation`: malformed request
    async fn mutate(&self, request: MutationRequest) -> Result<(), GatewayError>;
}

/// Shows modal alerts to the user.
pub trait AlertPresenter: Send + Sync {
    fn present(&self, alert: Alert);
}

/// Draws a collection.
///
/// Renderers are purely derived from the cache: they receive a snapshot of a
/// dirty collection and never mutate entities themselves.
pub trait RenderSurface: Send + Sync {
    fn redraw(&self, collection: &str, entities: &[Entity]);
}

/// Scripted gateway for testing.
#[cfg(test)]
pub struct MockGateway {
    results: parking_lot::Mutex<std::collections::VecDeque<Result<(), GatewayError>>>,
    requests: parking_lot::Mutex<Vec<MutationRequest>>,
}

#[cfg(test)]
impl MockGateway {
    /// Gateway that accepts everything.
    pub fn new() -> Self {
        Self {
            results: parking_lot::Mutex::new(std::collections::VecDeque::new()),
            requests: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// Script the next call's result. Unscripted calls succeed.
    pub fn with_result(self, result: Result<(), GatewayError>) -> Self {
        self.results.lock().push_back(result);
        self
    }

    pub fn requests(&self) -> Vec<MutationRequest> {
        self.requests.lock().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl MutationGateway for MockGateway {
    async fn mutate(&self, request: MutationRequest) -> Result<(), GatewayError> {
        self.requests.lock().push(request);
        self.results.lock().pop_front().unwrap_or(Ok(()))
    }
}

/// Alert presenter that records alerts.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingAlerts {
    pub alerts: parking_lot::Mutex<Vec<Alert>>,
}

#[cfg(test)]
impl AlertPresenter for RecordingAlerts {
    fn present(&self, alert: Alert) {
        self.alerts.lock().push(alert);
    }
}

/// Render surface that records redraws.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingSurface {
    pub redraws: parking_lot::Mutex<Vec<(String, Vec<Entity>)>>,
}

#[cfg(test)]
impl RecordingSurface {
    /// Collection names in redraw order.
    pub fn redrawn(&self) -> Vec<String> {
        self.redraws.lock().iter().map(|(name, _)| name.clone()).collect()
    }
}

#[cfg(test)]
impl RenderSurface for RecordingSurface {
    fn redraw(&self, collection: &str, entities: &[Entity]) {
        self.redraws
            .lock()
            .push((collection.to_string(), entities.to_vec()));
    }
}
