//! Spotify client error types

use thiserror::Error;

/// Spotify client errors
#[derive(Error, Debug)]
pub enum SpotifyError {
    /// Client id or secret is missing
    #[error("client credentials are required for Spotify API access")]
    MissingCredentials,

    /// Invalid input provided to a client method
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("Failed to parse Spotify response: {0}")]
    Parse(#[from] serde_json::Error),

    /// URL could not be built
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The token endpoint rejected a code exchange or refresh
    #[error("Spotify token endpoint returned {status}: {error}")]
    TokenEndpoint { status: u16, error: String },

    /// Request timeout
    #[error("Request to Spotify timed out")]
    Timeout,
}

impl SpotifyError {
    /// Check if this error is a transient transport failure
    ///
    /// 4xx token endpoint rejections are final: an authorization code is
    /// single-use and a rejected refresh token stays rejected.
    pub fn is_retryable(&self) -> bool {
        match self {
            SpotifyError::Timeout => true,
            SpotifyError::Http(e) => {
                if e.is_timeout() || e.is_connect() {
                    return true;
                }
                matches!(e.status(), Some(status) if status.is_server_error())
            }
            SpotifyError::TokenEndpoint { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SpotifyError::Timeout
        } else {
            SpotifyError::Http(e)
        }
    }
}

/// Result type for Spotify operations
pub type SpotifyResult<T> = Result<T, SpotifyError>;
