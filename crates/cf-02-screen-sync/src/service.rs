//! # Screen Service
//!
//! One screen: its entity cache, its echo guard, and the optimistic mutation
//! discipline it follows when the user acts.
//!
//! ## Optimistic Flow
//!
//! ```text
//! user action
//!   → apply to own cache (same reducer as foreign events) → redraw
//!   → arm echo guard with a fresh origin id
//!   → publish envelope(origin, event)  (own delivery is skipped as echo)
//!   → await gateway
//!       ok   → Confirmed
//!       err  → alert; rollback + corrective publish if the kind has one
//! ```
//!
//! Success-driven kinds (delete, edit, solve, revision) await the gateway
//! first and only then apply and publish.

use crate::config::ScreenConfig;
use crate::domain::{
    Alert, MutationError, MutationKind, MutationOutcome, MutationPayload, MutationRequest,
};
use crate::ports::{AlertPresenter, MutationGateway, RenderSurface, ScreenApi};
use async_trait::async_trait;
use cf_01_reconciliation::{apply_change, CacheError, EntityCache};
use feed_telemetry::{log_change, GATEWAY_FAILURES, SCREEN_MUTATIONS};
use parking_lot::Mutex;
use shared_bus::{
    ChangeBus, ChangeEnvelope, ChangeEvent, ChangePublisher, CommentAction, EchoGuard, OriginId,
    PublishReport, Subscription,
};
use shared_types::entities::{
    Comment, ConnectionPhase, Diagnosis, Engagement, Entity, EntityId, EntityKind,
};
use shared_types::errors::GatewayError;
use std::sync::Arc;
use tracing::{debug, warn};

/// State guarded together: the echo guard must see the cache it protects.
pub(crate) struct ScreenState {
    pub(crate) cache: EntityCache,
    pub(crate) guard: EchoGuard,
}

/// A screen holding cached entities and subscribed to the change bus.
pub struct Screen<G, A, R>
where
    G: MutationGateway,
    A: AlertPresenter,
    R: RenderSurface,
{
    pub(crate) config: ScreenConfig,
    pub(crate) state: Mutex<ScreenState>,
    bus: Arc<ChangeBus>,
    gateway: Arc<G>,
    alerts: Arc<A>,
    surface: Arc<R>,
    /// Dropped with the screen, which unsubscribes it.
    subscription: Mutex<Option<Subscription>>,
}

impl<G, A, R> Screen<G, A, R>
where
    G: MutationGateway + 'static,
    A: AlertPresenter + 'static,
    R: RenderSurface + 'static,
{
    /// Create a screen over an already fetched cache and subscribe it to
    /// `bus`.
    pub fn new(
        config: ScreenConfig,
        cache: EntityCache,
        bus: Arc<ChangeBus>,
        gateway: Arc<G>,
        alerts: Arc<A>,
        surface: Arc<R>,
    ) -> Arc<Self> {
        let guard = EchoGuard::new(config.echo.clone());
        let filter = config.filter.clone();
        let screen = Arc::new(Self {
            config,
            state: Mutex::new(ScreenState { cache, guard }),
            bus,
            gateway,
            alerts,
            surface,
            subscription: Mutex::new(None),
        });

        let subscription = screen.bus.subscribe(Arc::clone(&screen), filter);
        *screen.subscription.lock() = Some(subscription);
        screen
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Stop receiving changes. Dropping the screen does the same.
    pub fn detach(&self) {
        if let Some(subscription) = self.subscription.lock().take() {
            debug!(screen = %self.config.name, "Detaching from change bus");
            subscription.unsubscribe();
        }
    }

    pub fn is_attached(&self) -> bool {
        self.subscription
            .lock()
            .as_ref()
            .is_some_and(Subscription::is_active)
    }

    // =========================================================================
    // CACHE ACCESS
    // =========================================================================

    /// Run `read` against the cache.
    pub fn with_cache<T>(&self, read: impl FnOnce(&EntityCache) -> T) -> T {
        read(&self.state.lock().cache)
    }

    /// Copy of the first cached `id`.
    pub fn find(&self, id: &EntityId) -> Option<Entity> {
        self.state.lock().cache.find(id).cloned()
    }

    /// Copy of a collection's entities.
    pub fn snapshot(&self, collection: &str) -> Option<Vec<Entity>> {
        self.state
            .lock()
            .cache
            .collection(collection)
            .map(|c| c.entities().to_vec())
    }

    /// Append a freshly fetched page and redraw.
    pub fn load_page(&self, collection: &str, page: Vec<Entity>) -> Result<usize, CacheError> {
        let appended = self.state.lock().cache.append_page(collection, page)?;
        self.flush();
        Ok(appended)
    }

    /// Replace a collection after a full refetch and redraw.
    pub fn reload(&self, collection: &str, entities: Vec<Entity>) -> Result<(), CacheError> {
        self.state.lock().cache.replace_collection(collection, entities)?;
        self.flush();
        Ok(())
    }

    /// Entities a revision asked this screen to refetch.
    pub fn take_refetch(&self) -> Vec<EntityId> {
        self.state.lock().cache.take_stale()
    }

    /// Echoes still outstanding.
    pub fn pending_echoes(&self) -> usize {
        self.state.lock().guard.pending()
    }

    /// Redraw every dirty collection from the cache. Returns how many were
    /// redrawn.
    pub fn flush(&self) -> usize {
        let dirty: Vec<(String, Vec<Entity>)> = {
            let mut state = self.state.lock();
            let mut dirty = Vec::new();
            for collection in state.cache.collections_mut() {
                if collection.take_dirty() {
                    dirty.push((collection.name().to_string(), collection.entities().to_vec()));
                }
            }
            dirty
        };

        for (name, entities) in &dirty {
            self.surface.redraw(name, entities);
        }
        dirty.len()
    }

    // =========================================================================
    // MUTATION PLUMBING
    // =========================================================================

    fn engagement_of(&self, id: &EntityId) -> Result<Engagement, MutationError> {
        self.state
            .lock()
            .cache
            .find(id)
            .map(|entity| *entity.engagement())
            .ok_or_else(|| MutationError::NotCached(id.clone()))
    }

    fn cached_as<T>(
        &self,
        id: &EntityId,
        expected: EntityKind,
        pick: impl FnOnce(&Entity) -> Option<T>,
    ) -> Result<T, MutationError> {
        let state = self.state.lock();
        let entity = state
            .cache
            .find(id)
            .ok_or_else(|| MutationError::NotCached(id.clone()))?;
        pick(entity).ok_or_else(|| MutationError::WrongKind {
            id: id.clone(),
            expected,
            found: entity.kind(),
        })
    }

    /// Apply `event` locally, redraw, then publish it under a fresh origin id
    /// this screen expects back.
    fn apply_and_publish(&self, event: ChangeEvent) -> Result<PublishReport, MutationError> {
        let origin = OriginId::generate();
        let attached = self.is_attached();
        {
            let mut state = self.state.lock();
            apply_change(&mut state.cache, &event)?;
            if attached {
                state.guard.expect(origin);
            }
        }
        self.flush();

        let report = self
            .bus
            .publish_envelope(ChangeEnvelope::with_origin(origin, event));

        // Delivery is synchronous: an echo that has not arrived never will
        if self.state.lock().guard.forget(origin) {
            debug!(screen = %self.config.name, origin = %origin, "Own change was not delivered back");
        }
        Ok(report)
    }

    /// Await the gateway for an already applied change.
    async fn persist(&self, request: MutationRequest, rollback: Option<ChangeEvent>) -> MutationOutcome {
        let kind = request.kind;
        let entity = request.entity_id.clone();

        let outcome = match self.gateway.mutate(request).await {
            Ok(()) => MutationOutcome::Confirmed,
            Err(e) => {
                self.report_failure(kind, &entity, &e);
                if let Some(undo) = rollback {
                    if let Err(err) = self.apply_and_publish(undo) {
                        warn!(screen = %self.config.name, entity = %entity, error = %err, "Rollback failed");
                    }
                }
                MutationOutcome::on_failure(kind.policy())
            }
        };

        self.record(kind, &entity, outcome);
        outcome
    }

    /// Await the gateway, then apply and publish on success.
    async fn persist_then_publish(
        &self,
        request: MutationRequest,
        event: ChangeEvent,
    ) -> Result<MutationOutcome, MutationError> {
        let kind = request.kind;
        let entity = request.entity_id.clone();

        let outcome = match self.gateway.mutate(request).await {
            Ok(()) => {
                self.apply_and_publish(event)?;
                MutationOutcome::Confirmed
            }
            Err(e) => {
                self.report_failure(kind, &entity, &e);
                MutationOutcome::Rejected
            }
        };

        self.record(kind, &entity, outcome);
        Ok(outcome)
    }

    fn report_failure(&self, kind: MutationKind, entity: &EntityId, error: &GatewayError) {
        GATEWAY_FAILURES
            .with_label_values(&[kind.as_str(), error.label()])
            .inc();

        match error {
            GatewayError::Validation(_) => log_change!(
                error,
                self.config.name,
                "Gateway rejected request as invalid",
                kind.as_str(),
                entity,
                error = %error
            ),
            _ => log_change!(
                warn,
                self.config.name,
                "Remote mutation failed",
                kind.as_str(),
                entity,
                error = %error
            ),
        }

        self.alerts.present(Alert::for_failure(kind, error));
    }

    fn record(&self, kind: MutationKind, entity: &EntityId, outcome: MutationOutcome) {
        SCREEN_MUTATIONS
            .with_label_values(&[kind.as_str(), outcome.as_str()])
            .inc();
        log_change!(
            debug,
            self.config.name,
            "Mutation finished",
            kind.as_str(),
            entity,
            outcome = outcome.as_str()
        );
    }
}

#[async_trait]
impl<G, A, R> ScreenApi for Screen<G, A, R>
where
    G: MutationGateway + 'static,
    A: AlertPresenter + 'static,
    R: RenderSurface + 'static,
{
    async fn toggle_like(&self, id: &EntityId) -> Result<MutationOutcome, MutationError> {
        let was_liked = self.engagement_of(id)?.liked_by_viewer;
        self.apply_and_publish(ChangeEvent::LikeChange {
            entity_id: id.clone(),
            did_like: !was_liked,
        })?;

        let request = MutationRequest::new(
            MutationKind::Like,
            id.clone(),
            MutationPayload::UndoLike { was_liked },
        );
        Ok(self.persist(request, None).await)
    }

    async fn toggle_bookmark(&self, id: &EntityId) -> Result<MutationOutcome, MutationError> {
        let was_bookmarked = self.engagement_of(id)?.bookmarked_by_viewer;
        self.apply_and_publish(ChangeEvent::BookmarkChange {
            entity_id: id.clone(),
            did_bookmark: !was_bookmarked,
        })?;

        let request = MutationRequest::new(
            MutationKind::Bookmark,
            id.clone(),
            MutationPayload::UndoBookmark { was_bookmarked },
        );
        Ok(self.persist(request, None).await)
    }

    async fn add_comment(
        &self,
        root: &EntityId,
        comment: Comment,
    ) -> Result<MutationOutcome, MutationError> {
        let path = comment.path.clone();
        self.apply_and_publish(ChangeEvent::CommentChange {
            entity_id: root.clone(),
            path: path.clone(),
            comment: comment.clone(),
            action: CommentAction::Add,
        })?;

        let request = MutationRequest::new(
            MutationKind::CommentAdd,
            root.clone(),
            MutationPayload::Comment { path, comment },
        );
        Ok(self.persist(request, None).await)
    }

    async fn edit_comment(
        &self,
        root: &EntityId,
        comment: Comment,
    ) -> Result<MutationOutcome, MutationError> {
        let path = comment.path.clone();
        self.apply_and_publish(ChangeEvent::CommentChange {
            entity_id: root.clone(),
            path: path.clone(),
            comment: comment.clone(),
            action: CommentAction::Edit,
        })?;

        let request = MutationRequest::new(
            MutationKind::CommentEdit,
            root.clone(),
            MutationPayload::Comment { path, comment },
        );
        Ok(self.persist(request, None).await)
    }

    async fn remove_comment(
        &self,
        root: &EntityId,
        comment_id: &EntityId,
    ) -> Result<MutationOutcome, MutationError> {
        let removed = self.cached_as(comment_id, EntityKind::Comment, |e| e.as_comment().cloned())?;
        let path = removed.path.clone();

        self.apply_and_publish(ChangeEvent::CommentChange {
            entity_id: root.clone(),
            path: path.clone(),
            comment: removed.clone(),
            action: CommentAction::Remove,
        })?;

        let rollback = ChangeEvent::CommentChange {
            entity_id: root.clone(),
            path: path.clone(),
            comment: removed,
            action: CommentAction::Add,
        };
        let request = MutationRequest::new(
            MutationKind::CommentRemove,
            root.clone(),
            MutationPayload::RemoveComment {
                path,
                comment_id: comment_id.clone(),
            },
        );
        Ok(self.persist(request, Some(rollback)).await)
    }

    async fn change_connection(
        &self,
        user: &EntityId,
        phase: ConnectionPhase,
    ) -> Result<MutationOutcome, MutationError> {
        let previous = self.cached_as(user, EntityKind::User, |e| e.as_user().map(|u| u.connection))?;

        self.apply_and_publish(ChangeEvent::ConnectionChange {
            user_id: user.clone(),
            phase,
        })?;

        let rollback = ChangeEvent::ConnectionChange {
            user_id: user.clone(),
            phase: previous,
        };
        let request = MutationRequest::new(
            MutationKind::Connection,
            user.clone(),
            MutationPayload::Connection { phase },
        );
        Ok(self.persist(request, Some(rollback)).await)
    }

    async fn delete_entity(&self, id: &EntityId) -> Result<MutationOutcome, MutationError> {
        let request = MutationRequest::new(MutationKind::Delete, id.clone(), MutationPayload::Empty);
        self.persist_then_publish(request, ChangeEvent::VisibilityChange { entity_id: id.clone() })
            .await
    }

    async fn edit_entity(&self, entity: Entity) -> Result<MutationOutcome, MutationError> {
        let id = entity.id().clone();
        let request = MutationRequest::new(
            MutationKind::Edit,
            id.clone(),
            MutationPayload::Entity(entity.clone()),
        );
        self.persist_then_publish(
            request,
            ChangeEvent::EditChange {
                entity_id: id,
                full_entity: entity,
            },
        )
        .await
    }

    async fn mark_solved(
        &self,
        case: &EntityId,
        diagnosis: Option<Diagnosis>,
    ) -> Result<MutationOutcome, MutationError> {
        let request = MutationRequest::new(
            MutationKind::Solve,
            case.clone(),
            MutationPayload::Solve {
                diagnosis: diagnosis.clone(),
            },
        );
        self.persist_then_publish(
            request,
            ChangeEvent::SolveChange {
                entity_id: case.clone(),
                diagnosis,
            },
        )
        .await
    }

    async fn add_revision(&self, case: &EntityId) -> Result<MutationOutcome, MutationError> {
        let request =
            MutationRequest::new(MutationKind::Revision, case.clone(), MutationPayload::Empty);
        self.persist_then_publish(request, ChangeEvent::RevisionChange { entity_id: case.clone() })
            .await
    }
}
