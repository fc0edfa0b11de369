//! Integration tests for the message stats API.
//!
//! Most tests drive the router with a mocked Telegram collaborator. The
//! `live_*` tests talk to the real Telegram API and need APIID, APIHASH,
//! STRINGSESSION, TEST_PEER and TEST_MESSAGE_ID.
//! Run them with: cargo test --test integration -- --ignored

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use futures::future::join_all;
use pretty_assertions::assert_eq;
use tower::ServiceExt;

use telegram_check_view::api::error::{INTERNAL_MESSAGE, VALIDATION_MESSAGE};
use telegram_check_view::api::{create_router, AppState};
use telegram_check_view::config::Config;
use telegram_check_view::stats::{fetch_message_stats, StatsRequest};
use telegram_check_view::telegram::mock::{reactions_response, views_response};
use telegram_check_view::telegram::{
    MockConfig, MockTelegram, ReactionsResponse, SessionManager, TelegramConnector, ViewsResponse,
};

fn app(mock: &MockTelegram) -> Router {
    let sessions = Arc::new(SessionManager::new(Arc::new(mock.clone())));
    create_router(AppState::new(sessions))
}

async fn send_get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

fn json(bytes: &[u8]) -> serde_json::Value {
    serde_json::from_slice(bytes).unwrap()
}

fn sample_mock() -> MockTelegram {
    MockTelegram::with_config(MockConfig {
        views: views_response(10, Some("Group X")),
        reactions: reactions_response(&[("👍", 3), ("❤️", 2)]),
        ..Default::default()
    })
}

#[tokio::test]
async fn missing_parameters_are_rejected_without_remote_calls() {
    let mock = sample_mock();
    let app = app(&mock);

    for uri in [
        "/api/message",
        "/api/message?peer=chat1",
        "/api/message?id=42",
        "/api/message?peer=&id=42",
        "/api/message?peer=chat1&id=",
    ] {
        let (status, body) = send_get(&app, uri).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "uri: {}", uri);
        assert_eq!(json(&body), serde_json::json!({ "error": VALIDATION_MESSAGE }));
    }

    assert_eq!(mock.connect_calls(), 0);
    assert_eq!(mock.views_calls(), 0);
    assert_eq!(mock.reactions_calls(), 0);
}

#[tokio::test]
async fn non_integer_id_is_rejected() {
    let mock = sample_mock();

    let (status, body) = send_get(&app(&mock), "/api/message?peer=chat1&id=abc").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body), serde_json::json!({ "error": VALIDATION_MESSAGE }));
    assert_eq!(mock.views_calls(), 0);
}

#[tokio::test]
async fn stats_are_merged_into_one_response() {
    let mock = sample_mock();

    let (status, body) = send_get(&app(&mock), "/api/message?peer=chat1&id=42").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json(&body),
        serde_json::json!({
            "views": 10,
            "title": "Group X",
            "totalReactions": 5,
            "reactions": [
                { "count": 3, "reaction": "👍" },
                { "count": 2, "reaction": "❤️" }
            ]
        })
    );
    assert_eq!(mock.views_calls(), 1);
    assert_eq!(mock.reactions_calls(), 1);
}

#[tokio::test]
async fn missing_views_default_to_zero() {
    let mock = MockTelegram::with_config(MockConfig {
        views: ViewsResponse {
            views: None,
            chats: None,
        },
        reactions: reactions_response(&[("👍", 1)]),
        ..Default::default()
    });

    let (status, body) = send_get(&app(&mock), "/api/message?peer=chat1&id=42").await;

    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["views"], 0);
    assert_eq!(body["title"], serde_json::Value::Null);
    assert_eq!(body["totalReactions"], 1);
}

#[tokio::test]
async fn missing_or_empty_updates_yield_no_reactions() {
    for reactions in [
        ReactionsResponse { updates: None },
        ReactionsResponse {
            updates: Some(vec![]),
        },
    ] {
        let mock = MockTelegram::with_config(MockConfig {
            views: views_response(7, Some("Group X")),
            reactions,
            ..Default::default()
        });

        let (status, body) = send_get(&app(&mock), "/api/message?peer=chat1&id=42").await;

        assert_eq!(status, StatusCode::OK);
        let body = json(&body);
        assert_eq!(body["reactions"], serde_json::json!([]));
        assert_eq!(body["totalReactions"], 0);
    }
}

#[tokio::test]
async fn remote_failures_return_generic_error() {
    for config in [
        MockConfig {
            fail_views: true,
            ..Default::default()
        },
        MockConfig {
            fail_reactions: true,
            ..Default::default()
        },
        MockConfig {
            failing_connects: 1,
            ..Default::default()
        },
    ] {
        let mock = MockTelegram::with_config(config);

        let (status, body) = send_get(&app(&mock), "/api/message?peer=chat1&id=42").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json(&body), serde_json::json!({ "error": INTERNAL_MESSAGE }));

        let text = String::from_utf8(body).unwrap();
        assert!(!text.contains("Mock"));
    }
}

#[tokio::test]
async fn repeated_requests_are_identical_and_never_increment() {
    let mock = sample_mock();
    let app = app(&mock);

    let (_, first) = send_get(&app, "/api/message?peer=chat1&id=42").await;
    let (_, second) = send_get(&app, "/api/message?peer=chat1&id=42").await;

    assert_eq!(first, second);
    assert!(!mock.increment_requested());
}

#[tokio::test]
async fn sequential_requests_connect_once() {
    let mock = sample_mock();
    let app = app(&mock);

    send_get(&app, "/api/message?peer=chat1&id=42").await;
    send_get(&app, "/api/message?peer=chat1&id=43").await;

    assert_eq!(mock.connect_calls(), 1);
    assert_eq!(mock.views_calls(), 2);
}

#[tokio::test]
async fn concurrent_first_requests_connect_once() {
    let mut mock = MockTelegram::with_config(MockConfig {
        latency_ms: 30,
        ..Default::default()
    });
    mock.set_views(views_response(1, None));
    let app = app(&mock);

    let requests = (0..5).map(|i| {
        let app = app.clone();
        async move { send_get(&app, &format!("/api/message?peer=chat1&id={}", i)).await }
    });

    for (status, _) in join_all(requests).await {
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(mock.connect_calls(), 1);
}

#[tokio::test]
async fn connect_failure_is_retried_on_next_request() {
    let mock = MockTelegram::with_config(MockConfig {
        failing_connects: 1,
        ..Default::default()
    });
    let app = app(&mock);

    let (first, _) = send_get(&app, "/api/message?peer=chat1&id=42").await;
    let (second, _) = send_get(&app, "/api/message?peer=chat1&id=42").await;

    assert_eq!(first, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(mock.connect_calls(), 2);
}

/// Get a live config and target message from environment.
fn live_target() -> Option<(Config, StatsRequest)> {
    let config = Config::load().ok()?;
    config.validate().ok()?;

    let peer = std::env::var("TEST_PEER").ok()?;
    let id = std::env::var("TEST_MESSAGE_ID").ok()?.parse().ok()?;

    Some((config, StatsRequest { peer, id }))
}

/// Test that a real session connects and returns stats.
#[tokio::test]
#[ignore = "requires Telegram credentials"]
async fn live_fetch_message_stats() {
    let (config, request) = match live_target() {
        Some(target) => target,
        None => {
            println!("Skipping: Telegram credentials or TEST_PEER/TEST_MESSAGE_ID not set");
            return;
        }
    };

    let sessions = SessionManager::new(Arc::new(TelegramConnector::new(&config)));
    let api = tokio_test::assert_ok!(sessions.ensure_session().await);

    let first = tokio_test::assert_ok!(fetch_message_stats(api.as_ref(), &request).await);
    let second = tokio_test::assert_ok!(fetch_message_stats(api.as_ref(), &request).await);

    println!("Stats: {:?}", first);
    assert_eq!(first.total_reactions, second.total_reactions);
    assert!(second.views >= first.views);
}
