//! Error handling for the tunelink bot
//!
//! Every failure a command can hit is a [`BotError`]. Chat replies never show
//! the error's `Display` text; they show [`BotError::user_message`], which
//! collapses the variants into a few short messages a user can act on.

use thiserror::Error;
use tunelink_ollama_client::OllamaError;
use tunelink_spotify_client::SpotifyError;

/// Reply for users who have never linked an account
pub const CONNECT_MESSAGE: &str =
    "You haven't connected a Spotify account yet. Use /connect to link one.";

/// Reply for users whose stored tokens can no longer be renewed
pub const RECONNECT_MESSAGE: &str =
    "Your Spotify connection has expired. Use /connect to link your account again.";

/// Reply for upstream failures
pub const SERVICE_TROUBLE_MESSAGE: &str =
    "The music service is having trouble right now. Please try again later.";

/// Reply for generative-service failures
pub const AI_TROUBLE_MESSAGE: &str =
    "The AI service is having trouble right now. Please try again later.";

/// Reply when the generative service is not configured
pub const AI_NOT_CONFIGURED_MESSAGE: &str = "AI features are not configured.";

/// Reply when nothing usable came back from the generative service
pub const NOTHING_FOUND_MESSAGE: &str =
    "I couldn't come up with any recommendations right now.";

/// Main bot error type
#[derive(Error, Debug)]
pub enum BotError {
    // ========== Account Linking ==========
    /// No token record exists for the user
    #[error("user has not connected an account")]
    NotConnected,

    /// The provider rejected the token and renewing it failed
    #[error("authorization expired and token refresh failed")]
    ReconnectRequired,

    // ========== Provider ==========
    /// Non-auth failure from the provider API (status absent for transport
    /// or decode failures)
    #[error("music service unavailable (status: {status:?})")]
    ProviderUnavailable { status: Option<u16> },

    /// Spotify client failure outside of a gateway call
    #[error("Spotify error: {0}")]
    Spotify(#[from] SpotifyError),

    // ========== Generative Service ==========
    /// Generative service is not configured
    #[error("AI features are not configured")]
    AiNotConfigured,

    /// Generative service call failed
    #[error("AI service error: {0}")]
    Ollama(#[from] OllamaError),

    /// Model output did not match the expected structure
    #[error("malformed model output: {0}")]
    MalformedModelOutput(String),

    /// No candidate survived catalog verification
    #[error("no recommendations could be verified")]
    NoRecommendations,
}

impl BotError {
    /// Short message safe to show in chat
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NotConnected => CONNECT_MESSAGE,
            Self::ReconnectRequired => RECONNECT_MESSAGE,
            Self::ProviderUnavailable { .. } | Self::Spotify(_) => SERVICE_TROUBLE_MESSAGE,
            Self::AiNotConfigured => AI_NOT_CONFIGURED_MESSAGE,
            Self::Ollama(_) => AI_TROUBLE_MESSAGE,
            Self::MalformedModelOutput(_) | Self::NoRecommendations => NOTHING_FOUND_MESSAGE,
        }
    }

    /// Get the error code string for logs
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotConnected => "NOT_CONNECTED",
            Self::ReconnectRequired => "RECONNECT_REQUIRED",
            Self::ProviderUnavailable { .. } => "PROVIDER_UNAVAILABLE",
            Self::Spotify(_) => "SPOTIFY_ERROR",
            Self::AiNotConfigured => "AI_NOT_CONFIGURED",
            Self::Ollama(_) => "AI_SERVICE_ERROR",
            Self::MalformedModelOutput(_) => "MALFORMED_MODEL_OUTPUT",
            Self::NoRecommendations => "NO_RECOMMENDATIONS",
        }
    }

    /// Log the error with severity matching who can fix it
    pub fn log(&self) {
        match self {
            Self::NotConnected
            | Self::ReconnectRequired
            | Self::AiNotConfigured
            | Self::MalformedModelOutput(_)
            | Self::NoRecommendations => {
                tracing::debug!(error = %self, code = self.error_code(), "Command ended early");
            }
            Self::ProviderUnavailable { .. } | Self::Spotify(_) | Self::Ollama(_) => {
                tracing::warn!(error = %self, code = self.error_code(), "Upstream error");
            }
        }
    }
}

/// Result type alias for bot operations
pub type BotResult<T> = Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(BotError::NotConnected, CONNECT_MESSAGE)]
    #[case(BotError::ReconnectRequired, RECONNECT_MESSAGE)]
    #[case(BotError::ProviderUnavailable { status: Some(503) }, SERVICE_TROUBLE_MESSAGE)]
    #[case(BotError::ProviderUnavailable { status: None }, SERVICE_TROUBLE_MESSAGE)]
    #[case(BotError::AiNotConfigured, AI_NOT_CONFIGURED_MESSAGE)]
    #[case(BotError::Ollama(OllamaError::EmptyResponse), AI_TROUBLE_MESSAGE)]
    #[case(BotError::MalformedModelOutput("not json".into()), NOTHING_FOUND_MESSAGE)]
    #[case(BotError::NoRecommendations, NOTHING_FOUND_MESSAGE)]
    #[case(BotError::Spotify(SpotifyError::MissingCredentials), SERVICE_TROUBLE_MESSAGE)]
    fn test_user_message_families(#[case] error: BotError, #[case] expected: &str) {
        assert_eq!(error.user_message(), expected);
    }

    #[test]
    fn test_user_message_hides_status_codes() {
        let error = BotError::ProviderUnavailable { status: Some(502) };
        assert!(error.to_string().contains("502"));
        assert!(!error.user_message().contains("502"));
    }

    #[test]
    fn test_spotify_error_converts() {
        let error: BotError = SpotifyError::MissingCredentials.into();
        assert_eq!(error.error_code(), "SPOTIFY_ERROR");
    }
}
