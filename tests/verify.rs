// ABOUTME: Integration tests for revision verification against a scripted Portainer.
// ABOUTME: Covers mode routing, retry bounds, all-replica matching, and cancellation.

mod support;

use async_trait::async_trait;
use rollcall::api::PortainerClient;
use rollcall::engine::{
    Clock, Engine, EngineError, EngineErrorKind, OrchestrationMode, RevisionCheck,
};
use rollcall::transport::Method;
use rollcall::types::{ServiceName, StackName};
use serde_json::json;
use std::time::Duration;
use support::*;
use tokio_util::sync::CancellationToken;

fn stack() -> StackName {
    StackName::new("shop").unwrap()
}

fn services(names: &[&str]) -> Vec<ServiceName> {
    names.iter().map(|n| ServiceName::new(n).unwrap()).collect()
}

fn check(revision: &str, max_retries: u32) -> RevisionCheck {
    RevisionCheck::new(revision, "running", max_retries)
        .unwrap()
        .wait_between_retries(Duration::from_secs(10))
}

mod detection {
    use super::*;

    #[tokio::test]
    async fn cluster_id_means_swarm() {
        let transport = FakeTransport::new();
        swarm_mode(&transport);
        let engine = engine(&transport, &RecordingClock::default());

        assert_eq!(
            engine.detect_mode(ENV).await.unwrap(),
            OrchestrationMode::Swarm
        );
        assert_eq!(transport.paths(), vec![swarm_path()]);
    }

    #[tokio::test]
    async fn non_200_means_standalone() {
        let transport = FakeTransport::new();
        standalone_mode(&transport);
        let engine = engine(&transport, &RecordingClock::default());

        assert_eq!(
            engine.detect_mode(ENV).await.unwrap(),
            OrchestrationMode::Standalone
        );
    }

    #[tokio::test]
    async fn empty_cluster_id_means_standalone() {
        let transport = FakeTransport::new();
        transport.on_get(&swarm_path(), Reply::ok(json!({"ID": ""})));
        let engine = engine(&transport, &RecordingClock::default());

        assert_eq!(
            engine.detect_mode(ENV).await.unwrap(),
            OrchestrationMode::Standalone
        );
    }

    #[tokio::test]
    async fn undecodable_200_is_fatal() {
        let transport = FakeTransport::new();
        transport.on_get(&swarm_path(), Reply::Text(200, "<html>".to_string()));
        let engine = engine(&transport, &RecordingClock::default());

        let err = engine.detect_mode(ENV).await.unwrap_err();
        assert_eq!(err.kind(), EngineErrorKind::Detection);
    }

    #[tokio::test]
    async fn unreachable_control_plane_aborts_verification() {
        let transport = FakeTransport::new();
        transport.on_get(&swarm_path(), Reply::Refused);
        let clock = RecordingClock::default();
        let engine = engine(&transport, &clock);

        let failed = engine
            .verify_revision(ENV, &stack(), &services(&["web"]), &check("1.0.0", 5))
            .await
            .unwrap_err();

        assert_eq!(failed.error.kind(), EngineErrorKind::Detection);
        assert_eq!(transport.requests().len(), 1);
        assert!(clock.sleeps().is_empty());
        assert!(failed.outcome.mode.is_none());
    }
}

mod standalone {
    use super::*;

    #[tokio::test]
    async fn web_satisfied_api_never_resolved() {
        init_tracing();
        let transport = FakeTransport::new();
        standalone_mode(&transport);
        transport.on_get(
            &containers_path(),
            Reply::ok(json!([
                container("shop_web_1", "registry/app:1.4.0", "running"),
                container("shop_db_1", "postgres:16", "running")
            ])),
        );
        let clock = RecordingClock::default();
        let engine = engine(&transport, &clock);

        let failed = engine
            .verify_revision(ENV, &stack(), &services(&["web", "api"]), &check("1.4.0", 2))
            .await
            .unwrap_err();

        match &failed.error {
            EngineError::Exhausted {
                service, attempts, ..
            } => {
                assert_eq!(service, "shop_api");
                assert_eq!(*attempts, 2);
            }
            other => panic!("expected Exhausted, got {other}"),
        }

        let outcome = &failed.outcome;
        assert_eq!(outcome.mode, Some(OrchestrationMode::Standalone));
        assert!(outcome.verdict("shop_web").unwrap().satisfied);
        let api = outcome.verdict("shop_api").unwrap();
        assert!(!api.satisfied);
        assert_eq!(api.attempts, 2);

        let transcript = outcome.transcript.render();
        assert!(transcript.contains("shop_web: satisfied at revision 1.4.0"));
        assert!(transcript.contains("shop_api: attempt 1/2: no runtime target resolved"));
        assert!(transcript.contains("shop_api: attempt 2/2: no runtime target resolved"));

        // One sleep between the two api attempts, none after the last
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(10)]);
    }

    #[tokio::test]
    async fn only_container_listing_is_used() {
        let transport = FakeTransport::new();
        standalone_mode(&transport);
        transport.on_get(
            &containers_path(),
            Reply::ok(json!([container("shop-web-1", "registry/app:1.4.0", "running")])),
        );
        let engine = engine(&transport, &RecordingClock::default());

        let outcome = engine
            .verify_revision(ENV, &stack(), &services(&["web"]), &check("1.4.0", 3))
            .await
            .unwrap();

        assert!(outcome.all_satisfied());
        assert_eq!(transport.paths(), vec![swarm_path(), containers_path()]);
        assert_eq!(transport.requests()[1].query_value("all"), Some("1"));
        assert_eq!(transport.count(Method::Get, &tasks_path()), 0);
    }

    #[tokio::test]
    async fn never_matching_performs_exactly_max_attempts() {
        let transport = FakeTransport::new();
        standalone_mode(&transport);
        transport.on_get(
            &containers_path(),
            Reply::ok(json!([container("shop_web_1", "registry/app:1.3.0", "running")])),
        );
        let clock = RecordingClock::default();
        let engine = engine(&transport, &clock);

        let failed = engine
            .verify_revision(ENV, &stack(), &services(&["web"]), &check("1.4.0", 5))
            .await
            .unwrap_err();

        assert_eq!(failed.error.kind(), EngineErrorKind::Exhausted);
        assert_eq!(transport.count(Method::Get, &containers_path()), 5);
        assert_eq!(clock.sleeps().len(), 4);
    }

    #[tokio::test]
    async fn stopped_container_does_not_match() {
        let transport = FakeTransport::new();
        standalone_mode(&transport);
        transport.on_get(
            &containers_path(),
            Reply::ok(json!([container("shop_web_1", "registry/app:1.4.0", "exited")])),
        );
        let engine = engine(&transport, &RecordingClock::default());

        let failed = engine
            .verify_revision(ENV, &stack(), &services(&["web"]), &check("1.4.0", 1))
            .await
            .unwrap_err();

        let EngineError::Exhausted {
            last_observation, ..
        } = &failed.error
        else {
            panic!("expected Exhausted");
        };
        assert!(last_observation.contains("0/1 target(s) match"));
        assert!(last_observation.contains("exited"));
    }

    #[tokio::test]
    async fn similarly_named_containers_do_not_block_resolution() {
        let transport = FakeTransport::new();
        standalone_mode(&transport);
        transport.on_get(
            &containers_path(),
            Reply::ok(json!([
                container("eshop_web_1", "registry/other:0.1.0", "exited"),
                container("shop_webhook_1", "registry/hooks:0.2.0", "running"),
                container("shop_web_1", "registry/app:1.4.0", "running")
            ])),
        );
        let engine = engine(&transport, &RecordingClock::default());

        let outcome = engine
            .verify_revision(ENV, &stack(), &services(&["web"]), &check("1.4.0", 2))
            .await
            .unwrap();

        assert!(outcome.all_satisfied());
        assert_eq!(transport.count(Method::Get, &containers_path()), 1);
    }

    #[tokio::test]
    async fn scaled_service_needs_every_replica() {
        let transport = FakeTransport::new();
        standalone_mode(&transport);
        transport.on_get(
            &containers_path(),
            Reply::ok(json!([
                container("shop_web_1", "registry/app:1.4.0", "running"),
                container("shop_web_2", "registry/app:1.3.0", "running")
            ])),
        );
        transport.on_get(
            &containers_path(),
            Reply::ok(json!([
                container("shop_web_1", "registry/app:1.4.0", "running"),
                container("shop_web_2", "registry/app:1.4.0", "running")
            ])),
        );
        let engine = engine(&transport, &RecordingClock::default());

        let outcome = engine
            .verify_revision(ENV, &stack(), &services(&["web"]), &check("1.4.0", 3))
            .await
            .unwrap();

        assert_eq!(outcome.verdict("shop_web").unwrap().attempts, 2);
        assert!(outcome.transcript.render().contains("attempt 1/3: 1/2 target(s) match"));
    }

    #[tokio::test]
    async fn ambiguous_containers_are_retried_then_exhausted() {
        let transport = FakeTransport::new();
        standalone_mode(&transport);
        transport.on_get(
            &containers_path(),
            Reply::ok(json!([
                container("shop_web_1", "registry/app:1.4.0", "running"),
                container("legacy_shop_web_1", "registry/app:1.4.0", "running")
            ])),
        );
        let engine = engine(&transport, &RecordingClock::default());

        let failed = engine
            .verify_revision(ENV, &stack(), &services(&["web"]), &check("1.4.0", 2))
            .await
            .unwrap_err();

        let EngineError::Exhausted {
            last_observation, ..
        } = &failed.error
        else {
            panic!("expected Exhausted");
        };
        assert!(last_observation.starts_with("ambiguous, 2 containers match"));
        assert_eq!(transport.count(Method::Get, &containers_path()), 2);
    }
}

mod swarm {
    use super::*;

    #[tokio::test]
    async fn two_of_three_replicas_is_not_satisfied() {
        let transport = FakeTransport::new();
        swarm_mode(&transport);
        transport.on_get(
            &tasks_path(),
            Reply::ok(json!([
                task("t1", "image:2.0.0", "running"),
                task("t2", "image:2.0.0", "running"),
                task("t3", "image:1.9.0", "running")
            ])),
        );
        let clock = RecordingClock::default();
        let engine = engine(&transport, &clock);

        let failed = engine
            .verify_revision(ENV, &stack(), &services(&["payments"]), &check("2.0.0", 3))
            .await
            .unwrap_err();

        let EngineError::Exhausted {
            service,
            attempts,
            last_observation,
            ..
        } = &failed.error
        else {
            panic!("expected Exhausted");
        };
        assert_eq!(service, "shop_payments");
        assert_eq!(*attempts, 3);
        assert!(last_observation.contains("2/3 target(s) match"));
        assert!(last_observation.contains("image:1.9.0"));

        assert_eq!(transport.count(Method::Get, &tasks_path()), 3);
        assert_eq!(transport.count(Method::Get, &containers_path()), 0);
        assert_eq!(clock.sleeps().len(), 2);
    }

    #[tokio::test]
    async fn converges_on_a_later_attempt() {
        let transport = FakeTransport::new();
        swarm_mode(&transport);
        transport
            .on_get(
                &tasks_path(),
                Reply::ok(json!([
                    task("t1", "image:2.0.0", "running"),
                    task("t3", "image:1.9.0", "running")
                ])),
            )
            .on_get(
                &tasks_path(),
                Reply::ok(json!([
                    task("t1", "image:2.0.0", "running"),
                    task("t4", "image:2.0.0@sha256:abc", "Running")
                ])),
            );
        let engine = engine(&transport, &RecordingClock::default());

        let outcome = engine
            .verify_revision(ENV, &stack(), &services(&["payments"]), &check("2.0.0", 5))
            .await
            .unwrap();

        let verdict = outcome.verdict("shop_payments").unwrap();
        assert!(verdict.satisfied);
        assert_eq!(verdict.attempts, 2);
    }

    #[tokio::test]
    async fn task_filter_names_service_and_desired_state() {
        let transport = FakeTransport::new();
        swarm_mode(&transport);
        transport.on_get(
            &tasks_path(),
            Reply::ok(json!([task("t1", "image:2.0.0", "running")])),
        );
        let engine = engine(&transport, &RecordingClock::default());

        engine
            .verify_revision(ENV, &stack(), &services(&["payments"]), &check("2.0.0", 1))
            .await
            .unwrap();

        let request = &transport.requests()[1];
        let filters: serde_json::Value =
            serde_json::from_str(request.query_value("filters").unwrap()).unwrap();
        assert_eq!(
            filters,
            json!({"service": ["shop_payments"], "desired-state": ["running"]})
        );
    }

    #[tokio::test]
    async fn status_errors_are_retried() {
        let transport = FakeTransport::new();
        swarm_mode(&transport);
        transport
            .on_get(
                &tasks_path(),
                Reply::Json(500, json!({"message": "rpc error: deadline exceeded"})),
            )
            .on_get(
                &tasks_path(),
                Reply::ok(json!([task("t1", "image:2.0.0", "running")])),
            );
        let engine = engine(&transport, &RecordingClock::default());

        let outcome = engine
            .verify_revision(ENV, &stack(), &services(&["payments"]), &check("2.0.0", 3))
            .await
            .unwrap();

        assert_eq!(outcome.verdict("shop_payments").unwrap().attempts, 2);
        assert!(
            outcome
                .transcript
                .render()
                .contains("control plane error")
        );
    }

    #[tokio::test]
    async fn transport_errors_while_polling_are_fatal() {
        let transport = FakeTransport::new();
        swarm_mode(&transport);
        transport.on_get(&tasks_path(), Reply::Refused);
        let clock = RecordingClock::default();
        let engine = engine(&transport, &clock);

        let failed = engine
            .verify_revision(ENV, &stack(), &services(&["payments"]), &check("2.0.0", 5))
            .await
            .unwrap_err();

        match failed.error {
            EngineError::Unreachable {
                service, attempt, ..
            } => {
                assert_eq!(service, "shop_payments");
                assert_eq!(attempt, 1);
            }
            other => panic!("expected Unreachable, got {other}"),
        }
        assert_eq!(transport.count(Method::Get, &tasks_path()), 1);
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn first_failing_service_stops_the_run() {
        let transport = FakeTransport::new();
        swarm_mode(&transport);
        transport.on_get(&tasks_path(), Reply::ok(json!([])));
        let engine = engine(&transport, &RecordingClock::default());

        let failed = engine
            .verify_revision(
                ENV,
                &stack(),
                &services(&["payments", "web"]),
                &check("2.0.0", 2),
            )
            .await
            .unwrap_err();

        assert_eq!(failed.error.service(), Some("shop_payments"));
        assert_eq!(failed.outcome.verdicts.len(), 1);
        assert_eq!(transport.count(Method::Get, &tasks_path()), 2);
    }
}

mod timing {
    use super::*;

    #[tokio::test]
    async fn initial_wait_happens_once_before_first_check() {
        let transport = FakeTransport::new();
        swarm_mode(&transport);
        transport.on_get(
            &tasks_path(),
            Reply::ok(json!([task("t1", "image:2.0.0", "running")])),
        );
        let clock = RecordingClock::default();
        let engine = engine(&transport, &clock);
        let check = check("2.0.0", 3).wait_before_first(Duration::from_secs(90));

        let outcome = engine
            .verify_revision(ENV, &stack(), &services(&["web", "api"]), &check)
            .await
            .unwrap();

        assert_eq!(clock.sleeps(), vec![Duration::from_secs(90)]);
        assert!(
            outcome
                .transcript
                .render()
                .contains("waiting 1m 30s before the first check")
        );
    }

    #[tokio::test]
    async fn empty_service_list_is_rejected() {
        let transport = FakeTransport::new();
        let engine = engine(&transport, &RecordingClock::default());

        let failed = engine
            .verify_revision(ENV, &stack(), &[], &check("2.0.0", 3))
            .await
            .unwrap_err();

        assert_eq!(failed.error.kind(), EngineErrorKind::NoServices);
        assert!(transport.requests().is_empty());
    }
}

mod cancellation {
    use super::*;

    /// Cancels the token as soon as the engine starts waiting, then never wakes.
    #[derive(Clone)]
    struct CancellingClock(CancellationToken);

    #[async_trait]
    impl Clock for CancellingClock {
        async fn sleep(&self, _duration: Duration) {
            self.0.cancel();
            std::future::pending::<()>().await;
        }
    }

    #[tokio::test]
    async fn cancelled_token_sends_nothing() {
        let transport = FakeTransport::new();
        let token = CancellationToken::new();
        token.cancel();
        let engine = engine(&transport, &RecordingClock::default()).with_cancellation(token);

        let failed = engine
            .verify_revision(ENV, &stack(), &services(&["web"]), &check("2.0.0", 3))
            .await
            .unwrap_err();

        assert_eq!(failed.error.kind(), EngineErrorKind::Cancelled);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn cancellation_interrupts_retry_wait() {
        let transport = FakeTransport::new();
        swarm_mode(&transport);
        transport.on_get(&tasks_path(), Reply::ok(json!([])));
        let token = CancellationToken::new();
        let engine = Engine::with_clock(
            PortainerClient::new(transport.clone()),
            CancellingClock(token.clone()),
        )
        .with_cancellation(token);

        let failed = engine
            .verify_revision(ENV, &stack(), &services(&["web"]), &check("2.0.0", 10))
            .await
            .unwrap_err();

        assert_eq!(failed.error.kind(), EngineErrorKind::Cancelled);
        assert_eq!(transport.count(Method::Get, &tasks_path()), 1);
        assert!(
            failed
                .outcome
                .transcript
                .render()
                .contains("attempt 1/10")
        );
    }
}
