//! Spotify accounts and Web API response models

use std::fmt;

use serde::{Deserialize, Serialize};

/// Token endpoint response for both code exchange and refresh
///
/// `refresh_token` is only present when the provider issues (or rotates) one;
/// `expires_in` is advisory.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("expires_in", &self.expires_in)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// OAuth error body from the token endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct TokenErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Time window for top-items queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    /// Roughly the last four weeks
    #[default]
    ShortTerm,
    /// Roughly the last six months
    MediumTerm,
    /// Several years of history
    LongTerm,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShortTerm => "short_term",
            Self::MediumTerm => "medium_term",
            Self::LongTerm => "long_term",
        }
    }
}

/// A track from the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    pub album: Option<Album>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl Track {
    /// Comma-separated artist names
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Canonical link to the track on the provider
    pub fn url(&self) -> Option<&str> {
        self.external_urls.spotify.as_deref()
    }

    /// Largest available album cover
    pub fn cover_url(&self) -> Option<&str> {
        self.album.as_ref().and_then(|album| {
            album
                .images
                .iter()
                .max_by_key(|img| img.width.unwrap_or(0))
                .map(|img| img.url.as_str())
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub name: String,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

/// `GET /me/player/currently-playing` body
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentlyPlaying {
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub progress_ms: Option<u64>,
    /// `None` when an ad or an unsupported item type is playing
    pub item: Option<Track>,
}

/// Offset-based page of items
#[derive(Debug, Clone, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: Option<u32>,
}

/// `GET /search?type=track` body
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub tracks: Paging<Track>,
}

impl SearchResponse {
    /// Best match, if the search returned anything
    pub fn into_top_track(self) -> Option<Track> {
        self.tracks.items.into_iter().next()
    }
}

/// One entry of the recently-played history
#[derive(Debug, Clone, Deserialize)]
pub struct PlayHistory {
    pub track: Track,
    pub played_at: String,
}

/// `GET /me/player/recently-played` body
#[derive(Debug, Clone, Deserialize)]
pub struct RecentlyPlayed {
    pub items: Vec<PlayHistory>,
}
