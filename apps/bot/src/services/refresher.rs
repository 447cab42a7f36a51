//! Access token renewal

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use tunelink_spotify_client::SpotifyAuth;

use super::token_store::{TokenRecord, TokenStore};

/// Exchanges stored refresh tokens for new access tokens
///
/// Every renewal runs under the user's store lock, so two tasks refreshing
/// the same user cannot overwrite each other's result.
#[derive(Clone)]
pub struct TokenRefresher {
    auth: SpotifyAuth,
    store: Arc<dyn TokenStore>,
}

impl TokenRefresher {
    /// Create a refresher writing into `store`
    pub fn new(auth: SpotifyAuth, store: Arc<dyn TokenStore>) -> Self {
        Self { auth, store }
    }

    /// Renew the user's access token unconditionally
    ///
    /// Returns `None` when the user has no record or the token endpoint
    /// rejects the refresh; the stored record is left untouched in both cases.
    #[instrument(skip(self))]
    pub async fn refresh(&self, user_id: &str) -> Option<TokenRecord> {
        let _guard = self.store.lock(user_id).await;
        let current = self.store.get(user_id).await?;
        self.renew(user_id, current).await
    }

    /// Renew the user's access token unless `stale_access_token` was already
    /// replaced while this task waited for the lock
    ///
    /// A concurrent caller that lost the race gets the winner's record back
    /// without a second token endpoint call.
    #[instrument(skip(self, stale_access_token))]
    pub async fn refresh_stale(
        &self,
        user_id: &str,
        stale_access_token: &str,
    ) -> Option<TokenRecord> {
        let _guard = self.store.lock(user_id).await;
        let current = self.store.get(user_id).await?;

        if current.access_token != stale_access_token {
            debug!("Access token already renewed by another task");
            return Some(current);
        }

        self.renew(user_id, current).await
    }

    /// Caller must hold the user's lock
    async fn renew(&self, user_id: &str, current: TokenRecord) -> Option<TokenRecord> {
        match self.auth.refresh(&current.refresh_token).await {
            Ok(response) => {
                let rotated = response.refresh_token.is_some();
                let updated = current.merged_with(response);
                self.store.put(user_id, updated.clone()).await;
                info!(rotated, "Access token refreshed");
                Some(updated)
            }
            Err(e) => {
                warn!(error = %e, retryable = e.is_retryable(), "Token refresh failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::token_store::InMemoryTokenStore;
    use tunelink_test_utils::MockSpotifyServer;

    async fn setup(server: &MockSpotifyServer) -> (TokenRefresher, Arc<InMemoryTokenStore>) {
        let store = Arc::new(InMemoryTokenStore::new());
        let auth = SpotifyAuth::new(&server.config()).unwrap();
        (TokenRefresher::new(auth, store.clone()), store)
    }

    fn record(access: &str, refresh: &str) -> TokenRecord {
        TokenRecord {
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
            expires_in: Some(3600),
        }
    }

    #[tokio::test]
    async fn test_refresh_without_record_skips_endpoint() {
        let server = MockSpotifyServer::start().await;
        let (refresher, _store) = setup(&server).await;

        assert!(refresher.refresh("ghost").await.is_none());
        assert_eq!(server.token_calls().await, 0);
    }

    #[tokio::test]
    async fn test_refresh_keeps_refresh_token_when_not_rotated() {
        let server = MockSpotifyServer::start().await;
        server.mock_refresh_success("A2", None).await;
        let (refresher, store) = setup(&server).await;
        store.put("u1", record("A1", "R1")).await;

        let updated = refresher.refresh("u1").await.unwrap();

        assert_eq!(updated.access_token, "A2");
        assert_eq!(updated.refresh_token, "R1");
        assert_eq!(store.get("u1").await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_refresh_takes_rotated_refresh_token() {
        let server = MockSpotifyServer::start().await;
        server.mock_refresh_success("A2", Some("R2")).await;
        let (refresher, store) = setup(&server).await;
        store.put("u1", record("A1", "R1")).await;

        refresher.refresh("u1").await.unwrap();

        assert_eq!(store.get("u1").await.unwrap().refresh_token, "R2");
    }

    #[tokio::test]
    async fn test_failed_refresh_leaves_record_untouched() {
        let server = MockSpotifyServer::start().await;
        server.mock_refresh_failure(400).await;
        let (refresher, store) = setup(&server).await;
        store.put("u1", record("A1", "R1")).await;

        assert!(refresher.refresh("u1").await.is_none());
        assert_eq!(store.get("u1").await.unwrap(), record("A1", "R1"));
        assert_eq!(server.token_calls().await, 1);
    }

    #[tokio::test]
    async fn test_refresh_stale_returns_newer_record_without_endpoint_call() {
        let server = MockSpotifyServer::start().await;
        let (refresher, store) = setup(&server).await;
        store.put("u1", record("A2", "R1")).await;

        let current = refresher.refresh_stale("u1", "A1").await.unwrap();

        assert_eq!(current.access_token, "A2");
        assert_eq!(server.token_calls().await, 0);
    }
}
