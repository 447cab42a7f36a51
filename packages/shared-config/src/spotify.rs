//! Spotify provider configuration types

use std::fmt;

use url::Url;

use crate::{env_or, env_parse_or, env_required, ConfigError, ConfigResult};

/// Default accounts service (authorize + token endpoints)
pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";

/// Default Web API base URL
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

/// Scopes needed by the listening-data commands
pub const DEFAULT_SCOPES: &str =
    "user-read-currently-playing user-read-recently-played user-top-read";

/// Spotify OAuth application and API configuration
#[derive(Clone)]
pub struct SpotifyConfig {
    /// OAuth client id
    pub client_id: String,

    /// OAuth client secret
    pub client_secret: String,

    /// Redirect URI registered with the provider; must point at the callback server
    pub redirect_uri: String,

    /// Accounts service base URL (authorize and token endpoints)
    pub accounts_url: String,

    /// Web API base URL
    pub api_url: String,

    /// Space-separated OAuth scopes requested during authorization
    pub scopes: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl fmt::Debug for SpotifyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("accounts_url", &self.accounts_url)
            .field("api_url", &self.api_url)
            .field("scopes", &self.scopes)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl SpotifyConfig {
    /// Load Spotify configuration from environment variables
    ///
    /// `SPOTIFY_CLIENT_ID`, `SPOTIFY_CLIENT_SECRET` and `SPOTIFY_REDIRECT_URI`
    /// are required; everything else falls back to the public Spotify endpoints.
    pub fn from_env() -> ConfigResult<Self> {
        let client_id = non_empty(env_required("SPOTIFY_CLIENT_ID")?, "SPOTIFY_CLIENT_ID")?;
        let client_secret = non_empty(
            env_required("SPOTIFY_CLIENT_SECRET")?,
            "SPOTIFY_CLIENT_SECRET",
        )?;
        let redirect_uri = env_required("SPOTIFY_REDIRECT_URI")?;
        validate_url("SPOTIFY_REDIRECT_URI", &redirect_uri)?;

        let accounts_url = env_or("SPOTIFY_ACCOUNTS_URL", DEFAULT_ACCOUNTS_URL);
        validate_url("SPOTIFY_ACCOUNTS_URL", &accounts_url)?;
        let api_url = env_or("SPOTIFY_API_URL", DEFAULT_API_URL);
        validate_url("SPOTIFY_API_URL", &api_url)?;

        Ok(Self {
            client_id,
            client_secret,
            redirect_uri,
            accounts_url,
            api_url,
            scopes: env_or("SPOTIFY_SCOPES", DEFAULT_SCOPES),
            timeout_secs: env_parse_or("SPOTIFY_TIMEOUT", 10)?,
        })
    }

    /// Create a configuration whose accounts and API endpoints both live under
    /// `base_url` (useful for testing against a mock server)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base = base_url.trim_end_matches('/');
        Self {
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
            redirect_uri: "http://localhost:8888/callback".to_string(),
            accounts_url: base.to_string(),
            api_url: format!("{}/v1", base),
            scopes: DEFAULT_SCOPES.to_string(),
            timeout_secs: 5,
        }
    }

    /// Full URL of the token endpoint
    pub fn token_url(&self) -> String {
        format!("{}/api/token", self.accounts_url.trim_end_matches('/'))
    }

    /// Full URL of the authorize endpoint
    pub fn authorize_url(&self) -> String {
        format!("{}/authorize", self.accounts_url.trim_end_matches('/'))
    }

    /// Join a resource path onto the API base URL
    pub fn api_endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn non_empty(value: String, name: &str) -> ConfigResult<String> {
    if value.trim().is_empty() {
        return Err(ConfigError::missing(name));
    }
    Ok(value)
}

fn validate_url(name: &str, value: &str) -> ConfigResult<()> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidUrl {
            name: name.to_string(),
            reason: e.to_string(),
        })
}
