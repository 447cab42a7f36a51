//! Per-user OAuth token storage
//!
//! The store owns every [`TokenRecord`]. Reads and writes for different users
//! never contend; a refresh for one user holds that user's lock (see
//! [`TokenStore::lock`]) across its read-refresh-write sequence.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tunelink_spotify_client::TokenResponse;

/// Opaque chat-platform identity used as the store key
pub type UserId = String;

/// Access/refresh token pair for one user
#[derive(Clone, PartialEq, Eq)]
pub struct TokenRecord {
    /// Short-lived bearer credential
    pub access_token: String,
    /// Long-lived credential used to mint new access tokens
    pub refresh_token: String,
    /// Advisory lifetime of the access token in seconds
    pub expires_in: Option<u64>,
}

impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRecord")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

impl TokenRecord {
    /// Build the initial record from an authorization-code exchange
    pub fn from_exchange(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.unwrap_or_default(),
            expires_in: response.expires_in,
        }
    }

    /// Merge a refresh response into this record
    ///
    /// The access token is always replaced. The refresh token is replaced only
    /// when the provider rotated it, and `expires_in` only when it was sent.
    pub fn merged_with(&self, response: TokenResponse) -> Self {
        let refresh_token = response
            .refresh_token
            .filter(|token| !token.is_empty())
            .unwrap_or_else(|| self.refresh_token.clone());

        Self {
            access_token: response.access_token,
            refresh_token,
            expires_in: response.expires_in.or(self.expires_in),
        }
    }
}

/// Storage for per-user token records
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Current record for `user_id`, if the user ever connected
    async fn get(&self, user_id: &str) -> Option<TokenRecord>;

    /// Create or wholly replace the record for `user_id`
    async fn put(&self, user_id: &str, record: TokenRecord);

    /// Exclusive per-user guard; held across read-modify-write sequences
    async fn lock(&self, user_id: &str) -> OwnedMutexGuard<()>;
}

/// Process-local token store; contents are lost on restart
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    records: DashMap<UserId, TokenRecord>,
    guards: DashMap<UserId, Arc<Mutex<()>>>,
}

impl InMemoryTokenStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of connected users
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no user has connected yet
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn get(&self, user_id: &str) -> Option<TokenRecord> {
        self.records.get(user_id).map(|entry| entry.value().clone())
    }

    async fn put(&self, user_id: &str, record: TokenRecord) {
        self.records.insert(user_id.to_string(), record);
        tracing::debug!(user_id = %user_id, "Token record stored");
    }

    async fn lock(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let guard = self
            .guards
            .entry(user_id.to_string())
            .or_default()
            .value()
            .clone();
        guard.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn record(access: &str, refresh: &str) -> TokenRecord {
        TokenRecord {
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
            expires_in: Some(3600),
        }
    }

    fn refresh_response(access: &str, refresh: Option<&str>, expires_in: Option<u64>) -> TokenResponse {
        serde_json::from_value(serde_json::json!({
            "access_token": access,
            "refresh_token": refresh,
            "expires_in": expires_in,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_absent_user() {
        let store = InMemoryTokenStore::new();
        assert!(store.get("nobody").await.is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_put_replaces_whole_record() {
        let store = InMemoryTokenStore::new();
        store.put("u1", record("A1", "R1")).await;
        store
            .put(
                "u1",
                TokenRecord {
                    expires_in: None,
                    ..record("A2", "R2")
                },
            )
            .await;

        let stored = store.get("u1").await.unwrap();
        assert_eq!(stored.access_token, "A2");
        assert_eq!(stored.refresh_token, "R2");
        assert_eq!(stored.expires_in, None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_merge_keeps_refresh_token_when_not_rotated() {
        let merged = record("A1", "R1").merged_with(refresh_response("A2", None, None));
        assert_eq!(merged.access_token, "A2");
        assert_eq!(merged.refresh_token, "R1");
        assert_eq!(merged.expires_in, Some(3600));
    }

    #[test]
    fn test_merge_takes_rotated_refresh_token() {
        let merged = record("A1", "R1").merged_with(refresh_response("A2", Some("R2"), Some(1800)));
        assert_eq!(merged.refresh_token, "R2");
        assert_eq!(merged.expires_in, Some(1800));
    }

    #[test]
    fn test_merge_ignores_empty_refresh_token() {
        let merged = record("A1", "R1").merged_with(refresh_response("A2", Some(""), None));
        assert_eq!(merged.refresh_token, "R1");
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let debug = format!("{:?}", record("secret-access", "secret-refresh"));
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_lock_is_exclusive_per_user() {
        let store = Arc::new(InMemoryTokenStore::new());
        let held = store.lock("u1").await;

        let contender = {
            let store = store.clone();
            tokio::spawn(async move {
                let _guard = store.lock("u1").await;
            })
        };

        // Another user is not blocked by u1's guard
        tokio::time::timeout(Duration::from_millis(200), store.lock("u2"))
            .await
            .expect("different user should not block");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        drop(held);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("contender should acquire after release")
            .unwrap();
    }
}
