//! OAuth redirect endpoint
//!
//! - `GET /callback?code=..&state=..[&error=..]` - plain-text result page

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::services::{CallbackHandler, CallbackParams};

/// Shared state for the callback route
#[derive(Clone)]
pub struct CallbackState {
    pub handler: Arc<CallbackHandler>,
}

impl CallbackState {
    pub fn new(handler: CallbackHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }
}

/// Create callback router
pub fn callback_router(state: CallbackState) -> Router {
    Router::new()
        .route("/callback", get(oauth_callback))
        .with_state(state)
}

/// 200 when the account was connected, 400 otherwise
async fn oauth_callback(
    State(state): State<CallbackState>,
    Query(params): Query<CallbackParams>,
) -> impl IntoResponse {
    let result = state.handler.handle(params).await;
    let status = if result.is_success() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, result.message())
}
