//! Mock Spotify server for token lifecycle and resource tests
//!
//! Provides a [`MockSpotifyServer`] that serves both the accounts service
//! (`/authorize`, `/api/token`) and the Web API (`/v1/...`) from a single
//! wiremock instance, so one [`SpotifyConfig`] points every client at it.

use std::time::Duration;

use serde_json::{json, Value};
use tunelink_shared_config::SpotifyConfig;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path of the token endpoint
pub const TOKEN_PATH: &str = "/api/token";

/// Build a catalog track body the way the Web API returns it
pub fn track_json(title: &str, artist: &str) -> Value {
    let slug: String = title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();

    json!({
        "id": slug,
        "name": title,
        "artists": [{"name": artist, "external_urls": {"spotify": format!("https://open.spotify.com/artist/{}", slug)}}],
        "album": {
            "name": format!("{} (Album)", title),
            "images": [
                {"url": format!("https://i.scdn.co/image/{}-640", slug), "width": 640, "height": 640},
                {"url": format!("https://i.scdn.co/image/{}-64", slug), "width": 64, "height": 64}
            ]
        },
        "external_urls": {"spotify": format!("https://open.spotify.com/track/{}", slug)},
        "duration_ms": 240000
    })
}

/// Mock Spotify accounts service and Web API
///
/// Request counts are read back from the underlying server, so they reflect
/// exactly what the code under test sent.
pub struct MockSpotifyServer {
    server: MockServer,
}

impl MockSpotifyServer {
    /// Start a new mock Spotify server
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Get the server URL
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Config with accounts and API endpoints pointing at this server
    pub fn config(&self) -> SpotifyConfig {
        SpotifyConfig::with_base_url(self.url())
    }

    /// Get reference to the underlying mock server for custom mock setups
    pub fn inner(&self) -> &MockServer {
        &self.server
    }

    fn token_body(access_token: &str, refresh_token: Option<&str>) -> Value {
        let mut body = json!({
            "access_token": access_token,
            "token_type": "Bearer",
            "scope": "user-read-currently-playing",
            "expires_in": 3600
        });
        if let Some(refresh) = refresh_token {
            body["refresh_token"] = json!(refresh);
        }
        body
    }

    /// Mount a successful authorization-code exchange for `code`
    pub async fn mock_code_exchange_success(
        &self,
        code: &str,
        access_token: &str,
        refresh_token: &str,
    ) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains(format!("code={}", code)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(Self::token_body(access_token, Some(refresh_token))),
            )
            .mount(&self.server)
            .await;
    }

    /// Mount a rejected authorization-code exchange
    pub async fn mock_code_exchange_failure(&self, status_code: u16) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_string_contains("grant_type=authorization_code"))
            .respond_with(ResponseTemplate::new(status_code).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid authorization code"
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount a successful refresh; `rotated_refresh` is returned only when set
    pub async fn mock_refresh_success(&self, access_token: &str, rotated_refresh: Option<&str>) {
        self.mock_refresh_delayed(access_token, rotated_refresh, Duration::ZERO)
            .await;
    }

    /// Refresh grant that answers only after `delay`
    pub async fn mock_refresh_delayed(
        &self,
        access_token: &str,
        rotated_refresh: Option<&str>,
        delay: Duration,
    ) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(Self::token_body(access_token, rotated_refresh))
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn mock_refresh_failure(&self, status_code: u16) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(status_code).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Refresh token revoked"
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount a GET on `/v1{resource}` for requests carrying `access_token`
    pub async fn mock_resource(&self, resource: &str, access_token: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(format!("/v1{}", resource)))
            .and(header("authorization", format!("Bearer {}", access_token).as_str()))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Mount a 401 for `access_token` on `/v1{resource}`
    pub async fn mock_unauthorized(&self, resource: &str, access_token: &str) {
        self.mock_resource(
            resource,
            access_token,
            ResponseTemplate::new(401).set_body_json(json!({
                "error": {"status": 401, "message": "The access token expired"}
            })),
        )
        .await;
    }

    /// Mount a currently-playing response with `track`
    pub async fn mock_currently_playing(&self, access_token: &str, track: Value) {
        self.mock_resource(
            "/me/player/currently-playing",
            access_token,
            ResponseTemplate::new(200).set_body_json(json!({
                "is_playing": true,
                "progress_ms": 61000,
                "item": track
            })),
        )
        .await;
    }

    /// Mount the 204 the Web API sends when nothing is playing
    pub async fn mock_nothing_playing(&self, access_token: &str) {
        self.mock_resource(
            "/me/player/currently-playing",
            access_token,
            ResponseTemplate::new(204),
        )
        .await;
    }

    /// Mount a top-tracks page
    pub async fn mock_top_tracks(&self, access_token: &str, tracks: Vec<Value>) {
        let total = tracks.len();
        self.mock_resource(
            "/me/top/tracks",
            access_token,
            ResponseTemplate::new(200).set_body_json(json!({"items": tracks, "total": total})),
        )
        .await;
    }

    /// Mount a recently-played page
    pub async fn mock_recently_played(&self, access_token: &str, tracks: Vec<Value>) {
        let items: Vec<Value> = tracks
            .into_iter()
            .enumerate()
            .map(|(i, track)| {
                json!({"track": track, "played_at": format!("2024-05-01T12:{:02}:00Z", i)})
            })
            .collect();
        self.mock_resource(
            "/me/player/recently-played",
            access_token,
            ResponseTemplate::new(200).set_body_json(json!({"items": items})),
        )
        .await;
    }

    /// Mount a search hit for the exact title/artist query the client builds
    ///
    /// Mount these before [`Self::mock_search_miss_fallback`]; the first
    /// matching mock wins.
    pub async fn mock_search_hit(&self, access_token: &str, title: &str, artist: &str, track: Value) {
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(header("authorization", format!("Bearer {}", access_token).as_str()))
            .and(query_param(
                "q",
                format!("track:\"{}\" artist:\"{}\"", title, artist).as_str(),
            ))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"tracks": {"items": [track], "total": 1}})),
            )
            .mount(&self.server)
            .await;
    }

    /// Mount an empty search result for any query not matched earlier
    pub async fn mock_search_miss_fallback(&self, access_token: &str) {
        self.mock_resource(
            "/search",
            access_token,
            ResponseTemplate::new(200).set_body_json(json!({"tracks": {"items": [], "total": 0}})),
        )
        .await;
    }

    async fn count_requests(&self, predicate: impl Fn(&str) -> bool) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| predicate(request.url.path()))
            .count()
    }

    /// Number of requests that reached the token endpoint
    pub async fn token_calls(&self) -> usize {
        self.count_requests(|p| p == TOKEN_PATH).await
    }

    /// Number of Web API requests of any kind
    pub async fn resource_calls(&self) -> usize {
        self.count_requests(|p| p.starts_with("/v1/")).await
    }

    /// Number of Web API requests to `/v1{resource}`
    pub async fn calls_to(&self, resource: &str) -> usize {
        let wanted = format!("/v1{}", resource);
        self.count_requests(|p| p == wanted).await
    }

    /// Total requests of any kind
    pub async fn total_calls(&self) -> usize {
        self.count_requests(|_| true).await
    }
}
