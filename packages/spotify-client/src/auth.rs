//! Accounts service client: authorize URL and token endpoint

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument, warn};
use tunelink_shared_config::SpotifyConfig;
use url::Url;

use crate::error::{SpotifyError, SpotifyResult};
use crate::models::{TokenErrorResponse, TokenResponse};

/// Default connection timeout in seconds
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Client for the provider's OAuth endpoints
#[derive(Clone)]
pub struct SpotifyAuth {
    http_client: Client,
    config: SpotifyConfig,
}

impl fmt::Debug for SpotifyAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyAuth")
            .field("client_id", &self.config.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("token_url", &self.config.token_url())
            .finish()
    }
}

impl SpotifyAuth {
    /// Create a new accounts client from configuration
    ///
    /// # Errors
    /// Returns `SpotifyError::MissingCredentials` if the client id or secret is empty
    pub fn new(config: &SpotifyConfig) -> SpotifyResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .user_agent("tunelink/1.0")
            .build()?;

        Self::with_client(config, http_client)
    }

    /// Create an accounts client with a custom HTTP client
    pub fn with_client(config: &SpotifyConfig, http_client: Client) -> SpotifyResult<Self> {
        if config.client_id.is_empty() || config.client_secret.is_empty() {
            return Err(SpotifyError::MissingCredentials);
        }

        Ok(Self {
            http_client,
            config: config.clone(),
        })
    }

    /// Build the URL a user opens to grant access
    ///
    /// `state` is echoed back unchanged on the redirect and identifies which
    /// chat user the resulting tokens belong to.
    pub fn authorize_url(&self, state: &str) -> SpotifyResult<String> {
        if state.trim().is_empty() {
            return Err(SpotifyError::InvalidInput(
                "authorization state cannot be empty".to_string(),
            ));
        }

        let url = Url::parse_with_params(
            &self.config.authorize_url(),
            &[
                ("client_id", self.config.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", self.config.scopes.as_str()),
                ("state", state),
            ],
        )?;

        Ok(url.into())
    }

    /// Trade an authorization code for the initial token pair
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str) -> SpotifyResult<TokenResponse> {
        if code.trim().is_empty() {
            return Err(SpotifyError::InvalidInput(
                "authorization code cannot be empty".to_string(),
            ));
        }

        debug!("Exchanging authorization code");

        self.request_token(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ])
        .await
    }

    /// Obtain a new access token from a refresh token
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> SpotifyResult<TokenResponse> {
        if refresh_token.is_empty() {
            return Err(SpotifyError::InvalidInput(
                "refresh token cannot be empty".to_string(),
            ));
        }

        debug!("Refreshing access token");

        self.request_token(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    /// POST a form to the token endpoint with the client credentials attached
    async fn request_token(&self, params: &[(&str, &str)]) -> SpotifyResult<TokenResponse> {
        let mut form: Vec<(&str, &str)> = params.to_vec();
        form.push(("client_id", self.config.client_id.as_str()));
        form.push(("client_secret", self.config.client_secret.as_str()));

        let response = self
            .http_client
            .post(self.config.token_url())
            .form(&form)
            .send()
            .await
            .map_err(SpotifyError::from_transport)?;

        let status = response.status();
        let text = response.text().await.map_err(SpotifyError::from_transport)?;

        if !status.is_success() {
            let error = serde_json::from_str::<TokenErrorResponse>(&text)
                .map(|body| match body.error_description {
                    Some(description) => format!("{}: {}", body.error, description),
                    None => body.error,
                })
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("unknown").to_string());

            warn!(status = status.as_u16(), error = %error, "Token endpoint rejected request");

            return Err(SpotifyError::TokenEndpoint {
                status: status.as_u16(),
                error,
            });
        }

        let token: TokenResponse = serde_json::from_str(&text)?;
        if token.access_token.is_empty() {
            return Err(SpotifyError::TokenEndpoint {
                status: status.as_u16(),
                error: "response did not include an access token".to_string(),
            });
        }

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_requires_credentials() {
        let mut config = SpotifyConfig::with_base_url("http://localhost");
        config.client_secret = String::new();
        assert!(matches!(
            SpotifyAuth::new(&config),
            Err(SpotifyError::MissingCredentials)
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let auth = SpotifyAuth::new(&SpotifyConfig::with_base_url("http://localhost")).unwrap();
        let debug = format!("{:?}", auth);
        assert!(!debug.contains("test-client-secret"));
    }

    #[test]
    fn test_authorize_url_carries_state_and_redirect() {
        let auth = SpotifyAuth::new(&SpotifyConfig::with_base_url("http://localhost")).unwrap();
        let url = Url::parse(&auth.authorize_url("user-42").unwrap()).unwrap();
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.path(), "/authorize");
        assert_eq!(params["state"], "user-42");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["redirect_uri"], "http://localhost:8888/callback");
        assert_eq!(params["client_id"], "test-client-id");
    }

    #[test]
    fn test_authorize_url_rejects_blank_state() {
        let auth = SpotifyAuth::new(&SpotifyConfig::with_base_url("http://localhost")).unwrap();
        assert!(matches!(
            auth.authorize_url("  "),
            Err(SpotifyError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_exchange_code_posts_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=abc"))
            .and(body_string_contains("client_secret=test-client-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "A1",
                "token_type": "Bearer",
                "expires_in": 3600,
                "refresh_token": "R1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let auth = SpotifyAuth::new(&SpotifyConfig::with_base_url(server.uri())).unwrap();
        let token = auth.exchange_code("abc").await.unwrap();

        assert_eq!(token.access_token, "A1");
        assert_eq!(token.refresh_token.as_deref(), Some("R1"));
    }

    #[tokio::test]
    async fn test_refresh_rejection_maps_to_token_endpoint_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Refresh token revoked"
            })))
            .mount(&server)
            .await;

        let auth = SpotifyAuth::new(&SpotifyConfig::with_base_url(server.uri())).unwrap();
        let err = auth.refresh("R1").await.unwrap_err();

        match err {
            SpotifyError::TokenEndpoint { status, error } => {
                assert_eq!(status, 400);
                assert!(error.contains("invalid_grant"));
            }
            other => panic!("Expected TokenEndpoint, got: {:?}", other),
        }
        assert!(!SpotifyError::TokenEndpoint {
            status: 400,
            error: String::new()
        }
        .is_retryable());
    }

    #[tokio::test]
    async fn test_exchange_code_rejects_blank_code_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let auth = SpotifyAuth::new(&SpotifyConfig::with_base_url(server.uri())).unwrap();
        assert!(matches!(
            auth.exchange_code("").await,
            Err(SpotifyError::InvalidInput(_))
        ));
    }
}
