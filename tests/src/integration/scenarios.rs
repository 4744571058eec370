//! # User Scenarios
//!
//! End-to-end flows from a user action on one screen to the state of every
//! other screen, including remote failures and rollbacks.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use cf_02_screen_sync::{Alert, MutationKind, MutationOutcome, MutationPayload, ScreenApi};
    use shared_bus::{
        ChangeBus, ChangeEnvelope, ChangeEvent, ChangePublisher, ChangeSubscriber, ChangeTopic,
        Delivery, EchoGuardConfig, EventFilter, SubscriberError,
    };
    use shared_types::entities::{ConnectionPhase, Diagnosis, Entity, Post};
    use shared_types::errors::GatewayError;
    use parking_lot::Mutex;
    use std::sync::{Arc, Weak};

    // =========================================================================
    // LIKE
    // =========================================================================

    #[tokio::test]
    async fn test_like_scenario() {
        let bus = Arc::new(ChangeBus::new());
        let a = ScreenBuilder::new("home")
            .feed("for_you", vec![case("c1", 4, false, 0)])
            .attach(&bus);
        let b = ScreenBuilder::new("profile")
            .feed("cases", vec![case("c1", 4, false, 0)])
            .attach(&bus);

        a.screen.toggle_like(&id("c1")).await.unwrap();

        let on_a = engagement(&a.screen, "c1");
        assert_eq!((on_a.like_count, on_a.liked_by_viewer), (5, true));
        let on_b = engagement(&b.screen, "c1");
        assert_eq!((on_b.like_count, on_b.liked_by_viewer), (5, true));

        assert_eq!(a.surface.redraws(), vec!["for_you".to_string()]);
        assert_eq!(b.surface.redraws(), vec!["cases".to_string()]);
        assert_eq!(
            a.gateway.requests()[0].payload,
            MutationPayload::UndoLike { was_liked: false }
        );
    }

    #[tokio::test]
    async fn test_failed_like_leaves_screens_inconsistent() {
        let bus = Arc::new(ChangeBus::new());
        let a = ScreenBuilder::new("home")
            .feed("for_you", vec![case("c1", 4, false, 0)])
            .gateway(ScriptedGateway::failing_with(GatewayError::Network("offline".into())))
            .attach(&bus);
        let b = ScreenBuilder::new("profile")
            .feed("cases", vec![case("c1", 4, false, 0)])
            .attach(&bus);

        let outcome = a.screen.toggle_like(&id("c1")).await.unwrap();

        assert_eq!(outcome, MutationOutcome::LeftInconsistent);
        assert_eq!(engagement(&a.screen, "c1").like_count, 5);
        assert_eq!(engagement(&b.screen, "c1").like_count, 5);
        assert!(a.alerts.alerts()[0].retry);
        assert!(b.alerts.alerts().is_empty());
    }

    // =========================================================================
    // COMMENTS
    // =========================================================================

    #[tokio::test]
    async fn test_top_level_comment_scenario() {
        let bus = Arc::new(ChangeBus::new());
        let a = ScreenBuilder::new("home")
            .feed("for_you", vec![case("c1", 0, false, 2)])
            .attach(&bus);
        let b = ScreenBuilder::new("search")
            .feed("results", vec![case("c1", 0, false, 2)])
            .attach(&bus);
        let detail = ScreenBuilder::new("case-detail")
            .feed("header", vec![case("c1", 0, false, 2)])
            .thread(
                "comments",
                "c1",
                vec![],
                vec![comment("k1", vec![], 0), comment("k2", vec![], 0)],
            )
            .attach(&bus);

        let new_comment = comment("k3", vec![], 0);
        a.screen.add_comment(&id("c1"), new_comment.clone()).await.unwrap();

        assert_eq!(engagement(&a.screen, "c1").comment_count, 3);
        assert_eq!(engagement(&b.screen, "c1").comment_count, 3);
        assert_eq!(engagement(&detail.screen, "c1").comment_count, 3);

        let thread = detail.screen.snapshot("comments").unwrap();
        assert_eq!(thread.len(), 3);
        assert_eq!(thread[0], Entity::Comment(new_comment));
    }

    #[tokio::test]
    async fn test_failed_comment_removal_restored_everywhere() {
        let bus = Arc::new(ChangeBus::new());
        let detail = ScreenBuilder::new("case-detail")
            .feed("header", vec![case("c1", 0, false, 1)])
            .thread("comments", "c1", vec![], vec![comment("k1", vec![], 0)])
            .gateway(ScriptedGateway::failing_with(GatewayError::Network("offline".into())))
            .attach(&bus);
        let home = ScreenBuilder::new("home")
            .feed("for_you", vec![case("c1", 0, false, 1)])
            .attach(&bus);

        let outcome = detail.screen.remove_comment(&id("c1"), &id("k1")).await.unwrap();

        assert_eq!(outcome, MutationOutcome::RolledBack);
        assert_eq!(engagement(&detail.screen, "c1").comment_count, 1);
        assert_eq!(engagement(&home.screen, "c1").comment_count, 1);
        assert_eq!(detail.screen.snapshot("comments").unwrap().len(), 1);
        assert_eq!(bus.events_published(), 2);
    }

    #[tokio::test]
    async fn test_failed_removal_restores_feed_copies_in_place() {
        let bus = Arc::new(ChangeBus::new());
        let activity = vec![
            case("c1", 0, false, 1),
            comment("k1", vec![], 0).into(),
            case("c2", 0, false, 0),
        ];
        let a = ScreenBuilder::new("activity")
            .feed("recent", activity.clone())
            .gateway(ScriptedGateway::failing_with(GatewayError::Network("offline".into())))
            .attach(&bus);
        let b = ScreenBuilder::new("profile")
            .feed("recent", activity.clone())
            .thread("comments", "c1", vec![], vec![comment("k1", vec![], 0)])
            .attach(&bus);

        let outcome = a.screen.remove_comment(&id("c1"), &id("k1")).await.unwrap();

        assert_eq!(outcome, MutationOutcome::RolledBack);
        for screen in [&a.screen, &b.screen] {
            assert_eq!(screen.snapshot("recent").unwrap(), activity);
            assert_eq!(engagement(screen, "c1").comment_count, 1);
        }
        assert_eq!(b.screen.snapshot("comments").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_removal_at_zero_does_not_inflate_counter() {
        let bus = Arc::new(ChangeBus::new());
        let a = ScreenBuilder::new("case-detail")
            .feed("header", vec![case("c1", 0, false, 0)])
            .thread("comments", "c1", vec![], vec![comment("k1", vec![], 0)])
            .gateway(ScriptedGateway::failing_with(GatewayError::Network("offline".into())))
            .attach(&bus);
        let b = ScreenBuilder::new("home")
            .feed("for_you", vec![case("c1", 0, false, 0)])
            .attach(&bus);

        a.screen.remove_comment(&id("c1"), &id("k1")).await.unwrap();

        assert_eq!(engagement(&a.screen, "c1").comment_count, 0);
        assert_eq!(engagement(&b.screen, "c1").comment_count, 0);
        assert!(a.screen.find(&id("k1")).is_some());
    }

    #[tokio::test]
    async fn test_comment_edit_keeps_counters() {
        let bus = Arc::new(ChangeBus::new());
        let a = ScreenBuilder::new("a")
            .thread("comments", "c1", vec![], vec![comment("k1", vec![], 3)])
            .attach(&bus);
        let b = ScreenBuilder::new("b")
            .thread("comments", "c1", vec![], vec![comment("k1", vec![], 3)])
            .attach(&bus);

        let mut edited = comment("k1", vec![], 0);
        edited.body = "Ruled out malaria; considering typhoid".to_string();
        a.screen.edit_comment(&id("c1"), edited).await.unwrap();

        let on_b = b.screen.find(&id("k1")).unwrap();
        let on_b = on_b.as_comment().unwrap();
        assert_eq!(on_b.body, "Ruled out malaria; considering typhoid");
        assert_eq!(on_b.engagement.comment_count, 3);
    }

    // =========================================================================
    // SUCCESS-DRIVEN LIFECYCLE
    // =========================================================================

    #[tokio::test]
    async fn test_delete_not_found_scenario() {
        let bus = Arc::new(ChangeBus::new());
        let a = ScreenBuilder::new("home")
            .feed("for_you", vec![case("c1", 0, false, 0)])
            .gateway(ScriptedGateway::failing_with(GatewayError::NotFound(id("c1"))))
            .attach(&bus);
        let b = ScreenBuilder::new("profile")
            .feed("cases", vec![case("c1", 0, false, 0)])
            .attach(&bus);

        let outcome = a.screen.delete_entity(&id("c1")).await.unwrap();

        assert_eq!(outcome, MutationOutcome::Rejected);
        let alerts = a.alerts.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(
            alerts[0],
            Alert::for_failure(MutationKind::Delete, &GatewayError::NotFound(id("c1")))
        );
        assert_ne!(
            alerts[0],
            Alert::for_failure(MutationKind::Delete, &GatewayError::Network(String::new()))
        );
        assert_eq!(copies(&a.screen, "c1").len(), 1);
        assert_eq!(copies(&b.screen, "c1").len(), 1);
        assert_eq!(bus.events_published(), 0);
    }

    #[tokio::test]
    async fn test_solve_and_revision_propagate() {
        let bus = Arc::new(ChangeBus::new());
        let a = ScreenBuilder::new("case-detail")
            .feed("header", vec![case("c1", 0, false, 0)])
            .attach(&bus);
        let b = ScreenBuilder::new("home")
            .feed("for_you", vec![case("c1", 0, false, 0)])
            .attach(&bus);

        let diagnosis = Diagnosis {
            revision_id: id("r2"),
            text: "Typhoid fever".to_string(),
        };
        a.screen.mark_solved(&id("c1"), Some(diagnosis.clone())).await.unwrap();
        a.screen.add_revision(&id("c1")).await.unwrap();

        let on_b = b.screen.find(&id("c1")).unwrap();
        let on_b = on_b.as_case().unwrap();
        assert!(on_b.solved);
        assert_eq!(on_b.diagnosis.as_ref(), Some(&diagnosis));
        assert_eq!(b.screen.take_refetch(), vec![id("c1")]);
        assert_eq!(a.screen.take_refetch(), vec![id("c1")]);
    }

    #[tokio::test]
    async fn test_edit_replaces_in_place() {
        let bus = Arc::new(ChangeBus::new());
        let a = ScreenBuilder::new("a")
            .feed("latest", vec![Post::new("p1", "u1", "draft").into()])
            .attach(&bus);
        let b = ScreenBuilder::new("b")
            .feed("latest", vec![case("c1", 0, false, 0), Post::new("p1", "u1", "draft").into()])
            .attach(&bus);

        let mut edited = Post::new("p1", "u1", "final");
        edited.edited = true;
        a.screen.edit_entity(edited.clone().into()).await.unwrap();

        let latest = b.screen.snapshot("latest").unwrap();
        assert_eq!(latest[1], Entity::Post(edited));
    }

    // =========================================================================
    // CONNECTIONS
    // =========================================================================

    #[tokio::test]
    async fn test_connection_rollback_reaches_other_screens() {
        let bus = Arc::new(ChangeBus::new());
        let people = ScreenBuilder::new("people")
            .feed("suggested", vec![user("u9")])
            .gateway(ScriptedGateway::failing_with(GatewayError::Network("offline".into())))
            .attach(&bus);
        let profile = ScreenBuilder::new("profile")
            .feed("header", vec![user("u9")])
            .attach(&bus);

        let outcome = people
            .screen
            .change_connection(&id("u9"), ConnectionPhase::Requested)
            .await
            .unwrap();

        assert_eq!(outcome, MutationOutcome::RolledBack);
        for screen in [&people.screen, &profile.screen] {
            let user = screen.find(&id("u9")).unwrap();
            assert_eq!(user.as_user().unwrap().connection, ConnectionPhase::Unconnected);
        }
    }

    // =========================================================================
    // ECHO STRATEGIES
    // =========================================================================

    /// Reacts to every like by publishing a bookmark of the same entity,
    /// from inside the delivery.
    struct BookmarkOnLike {
        bus: Weak<ChangeBus>,
    }

    impl ChangeSubscriber for BookmarkOnLike {
        fn label(&self) -> &str {
            "bookmark-on-like"
        }

        fn on_change(&self, envelope: &ChangeEnvelope) -> Result<Delivery, SubscriberError> {
            let ChangeEvent::LikeChange { entity_id, .. } = &envelope.event else {
                return Ok(Delivery::Ignored);
            };
            let bus = self.bus.upgrade().ok_or(SubscriberError::Closed)?;
            bus.publish(ChangeEvent::BookmarkChange {
                entity_id: entity_id.clone(),
                did_bookmark: true,
            });
            Ok(Delivery::Applied)
        }
    }

    async fn nested_publish(echo: EchoGuardConfig) -> bool {
        let bus = Arc::new(ChangeBus::new());
        let relay = Arc::new(BookmarkOnLike {
            bus: Arc::downgrade(&bus),
        });
        // Registered first, so the nested bookmark reaches the screen before
        // the screen's own like comes back
        let _relay = bus.subscribe(Arc::clone(&relay), EventFilter::all());
        let a = ScreenBuilder::new("a")
            .echo(echo)
            .feed("latest", vec![case("c1", 0, false, 0)])
            .attach(&bus);

        a.screen.toggle_like(&id("c1")).await.unwrap();

        assert_eq!(engagement(&a.screen, "c1").like_count, 1);
        engagement(&a.screen, "c1").bookmarked_by_viewer
    }

    #[tokio::test]
    async fn test_correlated_guard_keeps_interleaved_event() {
        assert!(nested_publish(EchoGuardConfig::default()).await);
    }

    #[tokio::test]
    async fn test_next_delivery_guard_swallows_interleaved_event() {
        assert!(!nested_publish(EchoGuardConfig::next_delivery()).await);
    }

    #[tokio::test]
    async fn test_next_delivery_guard_left_armed_by_filtered_echo() {
        for (echo, expect_applied) in [
            (EchoGuardConfig::default(), true),
            (EchoGuardConfig::next_delivery(), false),
        ] {
            let bus = Arc::new(ChangeBus::new());
            // Its own connection change never comes back to this screen
            let people = ScreenBuilder::new("people")
                .echo(echo)
                .filter(EventFilter::topics(vec![ChangeTopic::Engagement]))
                .feed("suggested", vec![user("u9"), case("c1", 0, false, 0)])
                .attach(&bus);

            people
                .screen
                .change_connection(&id("u9"), ConnectionPhase::Requested)
                .await
                .unwrap();
            bus.publish(ChangeEvent::LikeChange {
                entity_id: id("c1"),
                did_like: true,
            });

            let applied = engagement(&people.screen, "c1").liked_by_viewer;
            assert_eq!(applied, expect_applied);
        }
    }

    // =========================================================================
    // TEARDOWN AND FAILURE ISOLATION
    // =========================================================================

    #[tokio::test]
    async fn test_dropped_screen_stops_receiving() {
        let bus = Arc::new(ChangeBus::new());
        let a = ScreenBuilder::new("a")
            .feed("latest", vec![case("c1", 0, false, 0)])
            .attach(&bus);
        let b = ScreenBuilder::new("b")
            .feed("latest", vec![case("c1", 0, false, 0)])
            .attach(&bus);
        assert_eq!(bus.subscriber_count(), 2);

        drop(b);
        assert_eq!(bus.subscriber_count(), 1);

        a.screen.toggle_like(&id("c1")).await.unwrap();
        assert_eq!(engagement(&a.screen, "c1").like_count, 1);
    }

    /// Opens a new screen the first time a like is delivered, as a user
    /// navigating in response to a change would.
    struct OpensScreenOnLike {
        bus: Weak<ChangeBus>,
        opened: Mutex<Option<ScreenHarness>>,
    }

    impl ChangeSubscriber for OpensScreenOnLike {
        fn label(&self) -> &str {
            "opens-screen-on-like"
        }

        fn on_change(&self, envelope: &ChangeEnvelope) -> Result<Delivery, SubscriberError> {
            if !matches!(envelope.event, ChangeEvent::LikeChange { .. }) {
                return Ok(Delivery::Ignored);
            }
            let bus = self.bus.upgrade().ok_or(SubscriberError::Closed)?;
            let mut opened = self.opened.lock();
            if opened.is_none() {
                *opened = Some(
                    ScreenBuilder::new("late")
                        .feed("latest", vec![case("c1", 0, false, 0)])
                        .attach(&bus),
                );
            }
            Ok(Delivery::Applied)
        }
    }

    #[tokio::test]
    async fn test_screen_opened_mid_delivery_misses_in_flight_event() {
        let bus = Arc::new(ChangeBus::new());
        let opener = Arc::new(OpensScreenOnLike {
            bus: Arc::downgrade(&bus),
            opened: Mutex::new(None),
        });
        let _opener = bus.subscribe(Arc::clone(&opener), EventFilter::all());

        let report = bus.publish(ChangeEvent::LikeChange {
            entity_id: id("c1"),
            did_like: true,
        });
        assert_eq!(report.receivers, 1);
        assert_eq!(bus.subscriber_count(), 2);

        let opened = opener.opened.lock();
        let late = opened.as_ref().expect("screen opened during delivery");
        assert_eq!(engagement(&late.screen, "c1").like_count, 0);

        // Later events reach it
        bus.publish(ChangeEvent::BookmarkChange {
            entity_id: id("c1"),
            did_bookmark: true,
        });
        assert!(engagement(&late.screen, "c1").bookmarked_by_viewer);
    }

    struct Broken;

    impl ChangeSubscriber for Broken {
        fn label(&self) -> &str {
            "broken"
        }

        fn on_change(&self, _envelope: &ChangeEnvelope) -> Result<Delivery, SubscriberError> {
            panic!("renderer crashed");
        }
    }

    #[tokio::test]
    async fn test_broken_subscriber_does_not_block_fan_out() {
        let bus = Arc::new(ChangeBus::new());
        let broken = Arc::new(Broken);
        let _broken = bus.subscribe(Arc::clone(&broken), EventFilter::all());
        let a = ScreenBuilder::new("a")
            .feed("latest", vec![case("c1", 0, false, 0)])
            .attach(&bus);
        let b = ScreenBuilder::new("b")
            .feed("latest", vec![case("c1", 0, false, 0)])
            .attach(&bus);

        let outcome = a.screen.toggle_bookmark(&id("c1")).await.unwrap();

        assert_eq!(outcome, MutationOutcome::Confirmed);
        assert!(engagement(&b.screen, "c1").bookmarked_by_viewer);
    }

    #[tokio::test]
    async fn test_mutations_are_counted() {
        let _ = feed_telemetry::register_metrics();
        let bus = Arc::new(ChangeBus::new());
        let a = ScreenBuilder::new("a")
            .feed("latest", vec![case("c1", 0, false, 0)])
            .gateway(ScriptedGateway::failing_with(GatewayError::Validation("bad".into())))
            .attach(&bus);

        a.screen.toggle_bookmark(&id("c1")).await.unwrap();

        let text = feed_telemetry::encode_metrics().unwrap();
        assert!(text.contains("cf_screen_mutations_total"));
        assert!(text.contains("cf_gateway_failures_total"));
        assert!(text.contains("left_inconsistent"));
    }
}
