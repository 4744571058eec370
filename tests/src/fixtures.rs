//! # Shared Fixtures
//!
//! Hand-written port doubles and screen builders used by the integration
//! flows and the benchmarks.

use async_trait::async_trait;
use cf_01_reconciliation::{EntityCache, EntityCollection};
use cf_02_screen_sync::{
    Alert, AlertPresenter, MutationGateway, MutationRequest, RenderSurface, Screen, ScreenConfig,
};
use parking_lot::Mutex;
use shared_bus::{ChangeBus, EchoGuardConfig, EventFilter};
use shared_types::entities::{Case, Comment, Engagement, Entity, EntityId, User};
use shared_types::errors::GatewayError;
use std::collections::VecDeque;
use std::sync::Arc;

/// Gateway returning scripted results in order, then success.
#[derive(Default)]
pub struct ScriptedGateway {
    results: Mutex<VecDeque<Result<(), GatewayError>>>,
    requests: Mutex<Vec<MutationRequest>>,
}

impl ScriptedGateway {
    pub fn accepting() -> Self {
        Self::default()
    }

    pub fn failing_with(error: GatewayError) -> Self {
        let gateway = Self::default();
        gateway.results.lock().push_back(Err(error));
        gateway
    }

    pub fn requests(&self) -> Vec<MutationRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl MutationGateway for ScriptedGateway {
    async fn mutate(&self, request: MutationRequest) -> Result<(), GatewayError> {
        self.requests.lock().push(request);
        self.results.lock().pop_front().unwrap_or(Ok(()))
    }
}

#[derive(Default)]
pub struct RecordingAlerts {
    alerts: Mutex<Vec<Alert>>,
}

impl RecordingAlerts {
    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().clone()
    }
}

impl AlertPresenter for RecordingAlerts {
    fn present(&self, alert: Alert) {
        self.alerts.lock().push(alert);
    }
}

/// Counts redraws per collection.
#[derive(Default)]
pub struct RecordingSurface {
    redraws: Mutex<Vec<String>>,
}

impl RecordingSurface {
    pub fn redraws(&self) -> Vec<String> {
        self.redraws.lock().clone()
    }
}

impl RenderSurface for RecordingSurface {
    fn redraw(&self, collection: &str, _entities: &[Entity]) {
        self.redraws.lock().push(collection.to_string());
    }
}

pub type TestScreen = Screen<ScriptedGateway, RecordingAlerts, RecordingSurface>;

/// A screen plus handles on its port doubles.
pub struct ScreenHarness {
    pub screen: Arc<TestScreen>,
    pub gateway: Arc<ScriptedGateway>,
    pub alerts: Arc<RecordingAlerts>,
    pub surface: Arc<RecordingSurface>,
}

/// Builder for a screen subscribed to a shared bus.
pub struct ScreenBuilder {
    config: ScreenConfig,
    cache: EntityCache,
    gateway: ScriptedGateway,
}

impl ScreenBuilder {
    pub fn new(name: &str) -> Self {
        feed_telemetry::init_test_logging();
        Self {
            config: ScreenConfig::new(name),
            cache: EntityCache::new(),
            gateway: ScriptedGateway::accepting(),
        }
    }

    pub fn echo(mut self, echo: EchoGuardConfig) -> Self {
        self.config = self.config.with_echo(echo);
        self
    }

    pub fn filter(mut self, filter: EventFilter) -> Self {
        self.config = self.config.with_filter(filter);
        self
    }

    pub fn feed(mut self, name: &str, entities: Vec<Entity>) -> Self {
        self.cache
            .add_collection(EntityCollection::feed(name).with_entities(entities))
            .expect("unique collection name");
        self
    }

    pub fn thread(mut self, name: &str, root: &str, path: Vec<&str>, comments: Vec<Comment>) -> Self {
        let path = path.into_iter().map(EntityId::new).collect();
        let collection = EntityCollection::thread(name, EntityId::new(root), path)
            .with_entities(comments.into_iter().map(Entity::Comment));
        self.cache
            .add_collection(collection)
            .expect("unique collection name");
        self
    }

    pub fn gateway(mut self, gateway: ScriptedGateway) -> Self {
        self.gateway = gateway;
        self
    }

    pub fn attach(self, bus: &Arc<ChangeBus>) -> ScreenHarness {
        let gateway = Arc::new(self.gateway);
        let alerts = Arc::new(RecordingAlerts::default());
        let surface = Arc::new(RecordingSurface::default());
        let screen = Screen::new(
            self.config,
            self.cache,
            Arc::clone(bus),
            Arc::clone(&gateway),
            Arc::clone(&alerts),
            Arc::clone(&surface),
        );
        ScreenHarness {
            screen,
            gateway,
            alerts,
            surface,
        }
    }
}

pub fn id(raw: &str) -> EntityId {
    EntityId::new(raw)
}

/// A case with the given engagement.
pub fn case(raw: &str, like_count: u32, liked: bool, comment_count: u32) -> Entity {
    let mut case = Case::new(raw, "author-1", "Recurrent fevers after travel");
    case.engagement = Engagement {
        like_count,
        liked_by_viewer: liked,
        bookmarked_by_viewer: false,
        comment_count,
    };
    case.into()
}

pub fn comment(raw: &str, path: Vec<&str>, replies: u32) -> Comment {
    let path = path.into_iter().map(EntityId::new).collect();
    let mut comment = Comment::new(raw, "author-2", "Have you ruled out malaria?", path);
    comment.engagement.comment_count = replies;
    comment
}

pub fn user(raw: &str) -> Entity {
    User::new(raw, "Dr. Adeyemi").into()
}

/// Engagement of the first cached copy of `raw` on `screen`.
pub fn engagement(screen: &TestScreen, raw: &str) -> Engagement {
    *screen
        .find(&id(raw))
        .expect("entity cached")
        .engagement()
}

/// Every cached copy of `raw` on `screen`, across collections.
pub fn copies(screen: &TestScreen, raw: &str) -> Vec<Entity> {
    screen.with_cache(|cache| {
        cache
            .collections()
            .iter()
            .flat_map(|c| c.entities())
            .filter(|e| e.id().as_str() == raw)
            .cloned()
            .collect()
    })
}
