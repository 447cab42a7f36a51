//! Resilient request gateway for the Spotify Web API
//!
//! Every data-fetching command goes through [`RequestGateway::call`], which:
//! - looks up the user's token record
//! - issues one authenticated GET
//! - on a 401, renews the token once and reissues the GET once
//! - classifies the final response into an [`ApiOutcome`]
//!
//! Callers never handle authentication failures themselves.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use tunelink_spotify_client::{
    CurrentlyPlaying, Paging, PlayHistory, RawResponse, RecentlyPlayed, SearchResponse,
    SpotifyApi, StatusCode, TimeRange, Track,
};

use super::refresher::TokenRefresher;
use super::token_store::TokenStore;
use crate::error::{BotError, BotResult};

/// Token renewals allowed per call; a 401 after the retry is final
const MAX_AUTH_RETRIES: u32 = 1;

/// Classified result of one gateway call
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome {
    /// The user has never connected an account
    Unauthenticated,
    /// Success with an empty body (e.g. nothing currently playing)
    NoContent,
    /// Non-success status, or `None` when the request never produced a
    /// usable response (transport failure, undecodable body)
    ProviderError(Option<StatusCode>),
    /// Authorization failed and renewing the token did not help
    RefreshFailed,
    /// Decoded response payload
    Success(Value),
}

impl ApiOutcome {
    /// Decode a success payload into `T`
    ///
    /// `NoContent` is `Ok(None)`. Every failure outcome maps to the error the
    /// command layer renders, and a payload that does not fit `T` counts as a
    /// provider error without a status.
    pub fn decode<T: DeserializeOwned>(self) -> BotResult<Option<T>> {
        match self {
            Self::Success(body) => serde_json::from_value(body).map(Some).map_err(|e| {
                warn!(error = %e, "Spotify payload did not match expected shape");
                BotError::ProviderUnavailable { status: None }
            }),
            Self::NoContent => Ok(None),
            Self::Unauthenticated => Err(BotError::NotConnected),
            Self::RefreshFailed => Err(BotError::ReconnectRequired),
            Self::ProviderError(status) => Err(BotError::ProviderUnavailable {
                status: status.map(|s| s.as_u16()),
            }),
        }
    }
}

/// Authenticated access to the Web API on behalf of chat users
#[derive(Clone)]
pub struct RequestGateway {
    api: SpotifyApi,
    store: Arc<dyn TokenStore>,
    refresher: TokenRefresher,
}

impl RequestGateway {
    /// Create a gateway reading tokens from `store` and renewing them via `refresher`
    pub fn new(api: SpotifyApi, store: Arc<dyn TokenStore>, refresher: TokenRefresher) -> Self {
        Self {
            api,
            store,
            refresher,
        }
    }

    /// Underlying Web API client (for URL builders)
    pub fn api(&self) -> &SpotifyApi {
        &self.api
    }

    /// GET `url` as `user_id` and classify the result
    #[instrument(skip(self))]
    pub async fn call(&self, user_id: &str, url: &str) -> ApiOutcome {
        let Some(mut record) = self.store.get(user_id).await else {
            debug!("No token record; user must connect first");
            return ApiOutcome::Unauthenticated;
        };

        let mut renewals = 0;
        loop {
            let response = match self.api.get(url, &record.access_token).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(error = %e, "Spotify request failed before a response");
                    return ApiOutcome::ProviderError(None);
                }
            };

            if response.status != StatusCode::UNAUTHORIZED {
                return Self::classify(response);
            }

            if renewals >= MAX_AUTH_RETRIES {
                warn!("Still unauthorized after token refresh");
                return ApiOutcome::RefreshFailed;
            }
            renewals += 1;

            debug!("Access token rejected, refreshing");
            match self
                .refresher
                .refresh_stale(user_id, &record.access_token)
                .await
            {
                Some(fresh) => record = fresh,
                None => return ApiOutcome::RefreshFailed,
            }
        }
    }

    fn classify(response: RawResponse) -> ApiOutcome {
        let status = response.status;

        if status == StatusCode::NO_CONTENT {
            return ApiOutcome::NoContent;
        }

        if !status.is_success() {
            warn!(status = status.as_u16(), "Spotify returned an error status");
            return ApiOutcome::ProviderError(Some(status));
        }

        if response.body.trim().is_empty() {
            return ApiOutcome::NoContent;
        }

        match serde_json::from_str(&response.body) {
            Ok(body) => ApiOutcome::Success(body),
            Err(e) => {
                warn!(error = %e, "Spotify success body is not JSON");
                ApiOutcome::ProviderError(None)
            }
        }
    }

    /// Track the user is listening to, `None` when nothing is playing
    pub async fn now_playing(&self, user_id: &str) -> BotResult<Option<CurrentlyPlaying>> {
        let url = self.api.currently_playing_url();
        self.call(user_id, &url).await.decode()
    }

    /// The user's most played tracks over `range`
    pub async fn top_tracks(
        &self,
        user_id: &str,
        limit: u32,
        range: TimeRange,
    ) -> BotResult<Vec<Track>> {
        let url = self.api.top_tracks_url(limit, range)?;
        let page: Option<Paging<Track>> = self.call(user_id, &url).await.decode()?;
        Ok(page.map(|page| page.items).unwrap_or_default())
    }

    /// The user's latest plays, newest first
    pub async fn recently_played(&self, user_id: &str, limit: u32) -> BotResult<Vec<PlayHistory>> {
        let url = self.api.recently_played_url(limit)?;
        let page: Option<RecentlyPlayed> = self.call(user_id, &url).await.decode()?;
        Ok(page.map(|page| page.items).unwrap_or_default())
    }

    /// Best catalog match for a title and artist, `None` on an empty result
    pub async fn search_track(
        &self,
        user_id: &str,
        title: &str,
        artist: &str,
    ) -> BotResult<Option<Track>> {
        let url = self.api.search_track_url(title, artist)?;
        let response: Option<SearchResponse> = self.call(user_id, &url).await.decode()?;
        Ok(response.and_then(SearchResponse::into_top_track))
    }
}
