//! HTTP route handlers for the tunelink bot
//!
//! The bot's only inbound HTTP traffic is the OAuth redirect and health
//! probes; chat commands arrive through the dispatcher.

pub mod callback;
pub mod health;

pub use callback::{callback_router, CallbackState};
pub use health::health_router;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

/// Full router served by the callback server
pub fn build_router(callback_state: CallbackState) -> Router {
    Router::new()
        .route("/", get(root))
        .merge(callback_router(callback_state))
        // Nested health routes: /health, /health/live
        .nest("/health", health_router())
        .layer(TraceLayer::new_for_http())
}

async fn root() -> &'static str {
    "tunelink bot - use /connect in chat to link your Spotify account"
}
