//! OAuth authorization-code callback handling
//!
//! The provider redirects the user's browser here after consent. The `state`
//! parameter carries the chat user id that started `/connect`.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, instrument, warn};
use tunelink_spotify_client::SpotifyAuth;

use super::token_store::{TokenRecord, TokenStore};

/// Query parameters of the provider redirect
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Outcome of one callback, rendered as plain text for the browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackResult {
    /// Tokens stored for this user
    Connected { user_id: String },
    /// Nothing stored
    Failed { reason: String },
}

impl CallbackResult {
    fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// Human-readable page body
    pub fn message(&self) -> String {
        match self {
            Self::Connected { .. } => {
                "Spotify account connected! You can close this window and return to chat."
                    .to_string()
            }
            Self::Failed { reason } => {
                format!("Spotify authorization failed: {}. Please run /connect again.", reason)
            }
        }
    }
}

/// Terminates the authorization-code redirect and seeds the token store
#[derive(Clone)]
pub struct CallbackHandler {
    auth: SpotifyAuth,
    store: Arc<dyn TokenStore>,
}

impl CallbackHandler {
    pub fn new(auth: SpotifyAuth, store: Arc<dyn TokenStore>) -> Self {
        Self { auth, store }
    }

    /// Exchange the code and store the initial token pair under `state`
    ///
    /// An `error` parameter short-circuits before any provider call.
    #[instrument(skip(self, params), fields(state = ?params.state))]
    pub async fn handle(&self, params: CallbackParams) -> CallbackResult {
        if let Some(error) = params.error.filter(|e| !e.is_empty()) {
            warn!(error = %error, "Provider reported an authorization error");
            return CallbackResult::failed(describe_provider_error(&error));
        }

        let code = params.code.filter(|c| !c.trim().is_empty());
        let state = params.state.filter(|s| !s.trim().is_empty());
        let (Some(code), Some(user_id)) = (code, state) else {
            warn!("Callback without code or state");
            return CallbackResult::failed("the link was incomplete");
        };

        match self.auth.exchange_code(&code).await {
            Ok(response) => {
                // Wait out any in-flight refresh so it cannot overwrite the new pair
                let _guard = self.store.lock(&user_id).await;
                self.store
                    .put(&user_id, TokenRecord::from_exchange(response))
                    .await;
                info!(user_id = %user_id, "Account connected");
                CallbackResult::Connected { user_id }
            }
            Err(e) => {
                warn!(error = %e, "Authorization code exchange failed");
                CallbackResult::failed("the authorization code could not be exchanged")
            }
        }
    }
}

fn describe_provider_error(error: &str) -> String {
    match error {
        "access_denied" => "access was denied".to_string(),
        other => format!("the provider reported '{}'", other),
    }
}
