//! Ollama client error types

use thiserror::Error;

/// Failures talking to an Ollama server
#[derive(Error, Debug)]
pub enum OllamaError {
    /// Transport-level failure not covered by a more specific variant
    #[error("Ollama request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not decode
    #[error("Ollama response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    /// Non-success status from the server
    #[error("Ollama returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The configured model has not been pulled
    #[error("model '{0}' is not available; pull it with `ollama pull {0}`")]
    ModelNotFound(String),

    /// No response within the configured timeout
    #[error("Ollama did not answer within {0}s")]
    Timeout(u64),

    /// Nothing accepted the connection
    #[error("no Ollama server reachable at {0}")]
    Unreachable(String),

    /// The model produced only whitespace
    #[error("model returned an empty completion")]
    EmptyResponse,

    /// Every attempt hit a transient failure
    #[error("gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

impl OllamaError {
    /// Transient failures worth another attempt
    ///
    /// A missing model or a 4xx/5xx answer will not fix itself on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Unreachable(_) => true,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

/// Result type for Ollama operations
pub type OllamaResult<T> = Result<T, OllamaError>;
