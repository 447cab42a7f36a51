//! Shared fixtures for bot integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tunelink_bot::services::{InMemoryTokenStore, TextGenerator, TokenRecord, TokenStore};
use tunelink_bot::{App, BotResult};
use tunelink_test_utils::MockSpotifyServer;

pub const NOW_PLAYING: &str = "/me/player/currently-playing";
pub const TOP_TRACKS: &str = "/me/top/tracks";
pub const RECENT: &str = "/me/player/recently-played";

/// Bot wired against a mock Spotify server
pub struct TestBot {
    pub spotify: MockSpotifyServer,
    pub store: Arc<InMemoryTokenStore>,
    pub app: App,
}

impl TestBot {
    pub async fn start() -> Self {
        Self::start_with_generator(None).await
    }

    pub async fn start_with_generator(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        let spotify = MockSpotifyServer::start().await;
        let store = Arc::new(InMemoryTokenStore::new());
        let app = App::with_parts(&spotify.config(), store.clone(), generator, 3)
            .expect("app should build against mock config");

        Self { spotify, store, app }
    }

    /// Seed a connected user
    pub async fn connect(&self, user_id: &str, access: &str, refresh: &str) {
        self.store.put(user_id, record(access, refresh)).await;
    }
}

pub fn record(access: &str, refresh: &str) -> TokenRecord {
    TokenRecord {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        expires_in: Some(3600),
    }
}

/// Generator returning canned text and counting prompts
pub struct StaticGenerator {
    text: String,
    calls: AtomicUsize,
}

impl StaticGenerator {
    pub fn new(text: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            text: text.into(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for StaticGenerator {
    async fn generate(&self, _prompt: &str) -> BotResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}
