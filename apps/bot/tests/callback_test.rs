//! OAuth callback route and its hand-off to the gateway

mod common;

use std::time::Duration;

use assert_matches::assert_matches;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{TestBot, NOW_PLAYING};
use tower::ServiceExt;
use tunelink_bot::services::{ApiOutcome, TokenStore};
use tunelink_test_utils::track_json;

async fn get(bot: &TestBot, uri: &str) -> (StatusCode, String) {
    let response = bot
        .app
        .router()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_error_param_never_exchanges() {
    let bot = TestBot::start().await;
    bot.spotify.mock_code_exchange_success("abc", "A1", "R1").await;

    let (status, body) = get(&bot, "/callback?code=abc&state=u1&error=access_denied").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("authorization failed"));
    assert_eq!(bot.spotify.token_calls().await, 0);
    assert!(bot.store.get("u1").await.is_none());
}

#[tokio::test]
async fn test_missing_code_is_bad_request() {
    let bot = TestBot::start().await;

    let (status, _) = get(&bot, "/callback?state=u1").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(bot.spotify.token_calls().await, 0);
}

#[tokio::test]
async fn test_rejected_code_is_bad_request() {
    let bot = TestBot::start().await;
    bot.spotify.mock_code_exchange_failure(400).await;

    let (status, body) = get(&bot, "/callback?code=expired&state=u1").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("/connect"));
    assert!(bot.store.is_empty());
}

#[tokio::test]
async fn test_callback_record_is_used_unchanged_by_next_call() {
    let bot = TestBot::start().await;
    bot.spotify.mock_code_exchange_success("abc", "A1", "R1").await;
    bot.spotify
        .mock_currently_playing("A1", track_json("Teardrop", "Massive Attack"))
        .await;

    let (status, body) = get(&bot, "/callback?code=abc&state=u1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("connected"));

    let stored = bot.store.get("u1").await.unwrap();
    let url = bot.app.gateway.api().currently_playing_url();
    let outcome = bot.app.gateway.call("u1", &url).await;

    assert_matches!(outcome, ApiOutcome::Success(_));
    assert_eq!(bot.store.get("u1").await.unwrap(), stored);
    assert_eq!(stored.access_token, "A1");
    assert_eq!(stored.refresh_token, "R1");
    // Only the code exchange touched the token endpoint
    assert_eq!(bot.spotify.token_calls().await, 1);
    assert_eq!(bot.spotify.calls_to(NOW_PLAYING).await, 1);
}

#[tokio::test]
async fn test_reconnect_during_refresh_keeps_new_tokens() {
    let bot = TestBot::start().await;
    bot.connect("u1", "A1", "R1").await;
    bot.spotify.mock_unauthorized(NOW_PLAYING, "A1").await;
    bot.spotify
        .mock_refresh_delayed("A2", None, Duration::from_millis(500))
        .await;
    bot.spotify
        .mock_currently_playing("A2", track_json("Teardrop", "Massive Attack"))
        .await;
    bot.spotify
        .mock_code_exchange_success("newcode", "A_NEW", "R_NEW")
        .await;

    let gateway = bot.app.gateway.clone();
    let url = gateway.api().currently_playing_url();
    let pending = tokio::spawn(async move { gateway.call("u1", &url).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    let (status, _) = get(&bot, "/callback?code=newcode&state=u1").await;
    assert_eq!(status, StatusCode::OK);

    assert_matches!(pending.await.unwrap(), ApiOutcome::Success(_));

    let stored = bot.store.get("u1").await.unwrap();
    assert_eq!(stored.access_token, "A_NEW");
    assert_eq!(stored.refresh_token, "R_NEW");
}

#[tokio::test]
async fn test_health_routes() {
    let bot = TestBot::start().await;

    let (status, body) = get(&bot, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    let (status, body) = get(&bot, "/health/live").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("alive"));
}
