//! Web API transport: bearer-authenticated GET and resource URL builders
//!
//! This layer does not interpret status codes. Classifying 200/204/401 and
//! renewing tokens is the caller's job; here a non-2xx status is a normal
//! [`RawResponse`], not an error.

use std::fmt;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};
use tunelink_shared_config::SpotifyConfig;
use url::Url;

use crate::error::{SpotifyError, SpotifyResult};
use crate::models::TimeRange;

/// Default connection timeout in seconds
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Maximum length of a title or artist used in a search query
const MAX_SEARCH_TERM_LENGTH: usize = 256;

/// Maximum page size accepted by the top/recent endpoints
const MAX_PAGE_LIMIT: u32 = 50;

/// Status and body of a completed GET
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Web API client
#[derive(Clone)]
pub struct SpotifyApi {
    http_client: Client,
    config: SpotifyConfig,
}

impl fmt::Debug for SpotifyApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyApi")
            .field("api_url", &self.config.api_url)
            .field("timeout_secs", &self.config.timeout_secs)
            .finish()
    }
}

impl SpotifyApi {
    /// Create a new Web API client from configuration
    pub fn new(config: &SpotifyConfig) -> SpotifyResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .pool_max_idle_per_host(5)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent("tunelink/1.0")
            .build()?;

        Ok(Self::with_client(config, http_client))
    }

    /// Create a client with custom HTTP client (for testing)
    pub fn with_client(config: &SpotifyConfig, http_client: Client) -> Self {
        Self {
            http_client,
            config: config.clone(),
        }
    }

    /// Issue one GET with `Authorization: Bearer <access_token>`
    ///
    /// # Errors
    /// Only transport failures (connect, timeout, body read) are errors.
    #[instrument(skip(self, access_token))]
    pub async fn get(&self, url: &str, access_token: &str) -> SpotifyResult<RawResponse> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(SpotifyError::from_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(SpotifyError::from_transport)?;

        debug!(status = status.as_u16(), body_len = body.len(), "Spotify GET completed");

        Ok(RawResponse { status, body })
    }

    /// `GET /me/player/currently-playing`
    pub fn currently_playing_url(&self) -> String {
        self.config.api_endpoint("me/player/currently-playing")
    }

    /// `GET /me/top/tracks`
    pub fn top_tracks_url(&self, limit: u32, range: TimeRange) -> SpotifyResult<String> {
        let limit = Self::clamp_limit(limit).to_string();
        self.endpoint_with_query(
            "me/top/tracks",
            &[("limit", limit.as_str()), ("time_range", range.as_str())],
        )
    }

    /// `GET /me/player/recently-played`
    pub fn recently_played_url(&self, limit: u32) -> SpotifyResult<String> {
        let limit = Self::clamp_limit(limit).to_string();
        self.endpoint_with_query("me/player/recently-played", &[("limit", limit.as_str())])
    }

    /// `GET /search` for the single best track matching title and artist
    pub fn search_track_url(&self, title: &str, artist: &str) -> SpotifyResult<String> {
        let title = Self::validate_search_term("title", title)?;
        let artist = Self::validate_search_term("artist", artist)?;
        let query = format!(
            "track:\"{}\" artist:\"{}\"",
            title.replace('"', ""),
            artist.replace('"', "")
        );

        self.endpoint_with_query(
            "search",
            &[("q", query.as_str()), ("type", "track"), ("limit", "1")],
        )
    }

    fn endpoint_with_query(&self, path: &str, params: &[(&str, &str)]) -> SpotifyResult<String> {
        let url = Url::parse_with_params(&self.config.api_endpoint(path), params)?;
        Ok(url.into())
    }

    fn clamp_limit(limit: u32) -> u32 {
        limit.clamp(1, MAX_PAGE_LIMIT)
    }

    fn validate_search_term<'a>(field: &str, term: &'a str) -> SpotifyResult<&'a str> {
        let trimmed = term.trim();
        if trimmed.is_empty() {
            return Err(SpotifyError::InvalidInput(format!(
                "search {} cannot be empty",
                field
            )));
        }
        if trimmed.len() > MAX_SEARCH_TERM_LENGTH {
            return Err(SpotifyError::InvalidInput(format!(
                "search {} too long (max {} characters)",
                field, MAX_SEARCH_TERM_LENGTH
            )));
        }
        Ok(trimmed)
    }
}
