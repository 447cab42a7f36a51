//! Service wiring
//!
//! Builds the shared token store and every component that reads it, so the
//! callback server and the command dispatcher see the same records.

use std::sync::Arc;

use axum::Router;
use tunelink_ollama_client::OllamaClient;
use tunelink_shared_config::SpotifyConfig;
use tunelink_spotify_client::{SpotifyApi, SpotifyAuth};

use crate::commands::CommandHandler;
use crate::config::Config;
use crate::error::BotResult;
use crate::routes::{build_router, CallbackState};
use crate::services::{
    CallbackHandler, InMemoryTokenStore, RequestGateway, TextGenerator, TokenRefresher,
    TokenStore,
};

/// Fully wired bot services
#[derive(Clone)]
pub struct App {
    pub store: Arc<dyn TokenStore>,
    pub gateway: Arc<RequestGateway>,
    pub callback: CallbackHandler,
    pub commands: Arc<CommandHandler>,
}

impl App {
    /// Wire the bot from process configuration
    pub fn new(config: &Config) -> BotResult<Self> {
        let generator: Option<Arc<dyn TextGenerator>> = match config.ollama() {
            Some(ollama) => Some(Arc::new(OllamaClient::new(ollama)?) as Arc<dyn TextGenerator>),
            None => None,
        };

        Self::with_parts(
            config.spotify(),
            Arc::new(InMemoryTokenStore::new()),
            generator,
            config.recommendation_count,
        )
    }

    /// Wire the bot from explicit parts
    pub fn with_parts(
        spotify: &SpotifyConfig,
        store: Arc<dyn TokenStore>,
        generator: Option<Arc<dyn TextGenerator>>,
        recommendation_count: usize,
    ) -> BotResult<Self> {
        let auth = SpotifyAuth::new(spotify)?;
        let api = SpotifyApi::new(spotify)?;

        let refresher = TokenRefresher::new(auth.clone(), store.clone());
        let gateway = Arc::new(RequestGateway::new(api, store.clone(), refresher));
        let callback = CallbackHandler::new(auth.clone(), store.clone());
        let commands = Arc::new(CommandHandler::new(
            gateway.clone(),
            auth,
            generator,
            recommendation_count,
        ));

        Ok(Self {
            store,
            gateway,
            callback,
            commands,
        })
    }

    /// HTTP router for the callback server
    pub fn router(&self) -> Router {
        build_router(CallbackState::new(self.callback.clone()))
    }
}
