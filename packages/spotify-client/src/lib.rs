//! Spotify accounts and Web API client for tunelink
//!
//! This crate provides the HTTP plumbing for the music provider:
//! - Authorization URL construction
//! - Authorization-code exchange and token refresh
//! - Bearer-authenticated GET against the Web API
//! - Resource URL builders and response models
//!
//! It deliberately keeps no token state. Storing tokens, renewing them on a
//! 401 and classifying responses live in the bot's request gateway.
//!
//! # Example
//!
//! ```rust,no_run
//! use tunelink_shared_config::SpotifyConfig;
//! use tunelink_spotify_client::{SpotifyApi, SpotifyAuth};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SpotifyConfig::from_env()?;
//! let auth = SpotifyAuth::new(&config)?;
//! println!("Connect at {}", auth.authorize_url("chat-user-1")?);
//!
//! let tokens = auth.exchange_code("code-from-redirect").await?;
//! let api = SpotifyApi::new(&config)?;
//! let response = api.get(&api.currently_playing_url(), &tokens.access_token).await?;
//! println!("{}", response.status);
//! # Ok(())
//! # }
//! ```

mod auth;
mod client;
mod error;
mod models;

pub use auth::SpotifyAuth;
pub use client::{RawResponse, SpotifyApi};
pub use error::{SpotifyError, SpotifyResult};
pub use models::{
    Album, Artist, CurrentlyPlaying, ExternalUrls, Image, Paging, PlayHistory, RecentlyPlayed,
    SearchResponse, TimeRange, TokenResponse, Track,
};

pub use reqwest::StatusCode;
