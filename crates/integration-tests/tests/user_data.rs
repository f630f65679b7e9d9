//! User-data behavior: missing data is not an error, and logout wipes
//! everything.

use std::time::Duration;

use fitsense_integration_tests::{
    TestService, drain_events, next_event_matching, session_json,
};
use fitsense_sdk::{RecommendationKind, WidgetEvent};

#[tokio::test]
async fn test_missing_user_data_completes_without_error() {
    let service = TestService::start().await;
    service
        .mount_json("POST", "/sessions", session_json(true, true))
        .await;
    // The user owns nothing and has no measurements on file.
    service.mount_status("GET", "/user-products", 404).await;
    service
        .mount_status("GET", "/user-body-measurements", 404)
        .await;
    service.mount_happy_path(false).await;

    let widget = service.widget();
    let mut events = widget.subscribe();

    widget.load("sku-1").await;

    let mut seen = vec![
        next_event_matching(&mut events, |e| {
            matches!(e, WidgetEvent::SizeRecommendationReady { .. })
        })
        .await,
    ];
    seen.extend(drain_events(&mut events));

    assert!(
        !seen
            .iter()
            .any(|e| matches!(e, WidgetEvent::InPageError { .. })),
        "404 on user data must not surface as an error"
    );
    match seen.first() {
        Some(WidgetEvent::SizeRecommendationReady {
            comparison, body, ..
        }) => {
            assert!(comparison.is_none());
            assert!(body.is_none());
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn test_user_data_server_error_surfaces_in_page_error() {
    let service = TestService::start().await;
    service.mount_status("GET", "/user-products", 500).await;
    service.mount_happy_path(true).await;

    let widget = service.widget();
    let mut events = widget.subscribe();

    widget.load("sku-1").await;

    let event = next_event_matching(&mut events, |e| {
        matches!(
            e,
            WidgetEvent::InPageError { .. } | WidgetEvent::SizeRecommendationReady { .. }
        )
    })
    .await;
    assert!(
        matches!(event, WidgetEvent::InPageError { .. }),
        "a non-404 user-data failure must abort with an in-page error"
    );
}

#[tokio::test]
async fn test_logout_clears_recommendations_and_deletes_remote_data() {
    let service = TestService::start().await;
    service.mount_happy_path(true).await;

    let widget = service.widget();
    let mut events = widget.subscribe();

    widget.load("sku-1").await;
    next_event_matching(&mut events, |e| {
        matches!(e, WidgetEvent::SizeRecommendationReady { .. })
    })
    .await;

    widget.logout().await;

    // Re-publishing after logout must show no stored recommendations.
    widget.request_recommendation(RecommendationKind::Both).await;
    let event = next_event_matching(&mut events, |e| {
        matches!(e, WidgetEvent::SizeRecommendationReady { .. })
    })
    .await;
    match event {
        WidgetEvent::SizeRecommendationReady {
            comparison, body, ..
        } => {
            assert!(comparison.is_none());
            assert!(body.is_none());
        }
        other => panic!("unexpected event: {other:?}"),
    }

    // Remote deletion runs on a detached task.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let requests = service
        .server
        .received_requests()
        .await
        .expect("request recording enabled");
    let deletions = requests
        .iter()
        .filter(|request| request.url.path() == "/user-data")
        .count();
    assert_eq!(deletions, 1, "logout must request remote deletion once");
}
