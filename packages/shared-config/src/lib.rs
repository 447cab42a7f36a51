//! Environment-driven configuration shared by tunelink services
//!
//! Holds the Spotify application settings, the optional Ollama settings and
//! the `env_*` helpers the services read their own variables with.

mod error;
mod ollama;
mod spotify;

pub use error::{ConfigError, ConfigResult};
pub use ollama::OllamaConfig;
pub use spotify::{SpotifyConfig, DEFAULT_ACCOUNTS_URL, DEFAULT_API_URL, DEFAULT_SCOPES};

use std::env;
use std::fmt;
use std::str::FromStr;

/// Settings every tunelink service needs
#[derive(Debug, Clone)]
pub struct CommonConfig {
    pub spotify: SpotifyConfig,
    /// `None` leaves the AI commands disabled
    pub ollama: Option<OllamaConfig>,
    pub environment: Environment,
}

impl CommonConfig {
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self {
            spotify: SpotifyConfig::from_env()?,
            ollama: OllamaConfig::from_env_optional()?,
            environment: env_or("ENVIRONMENT", "development")
                .parse()
                .unwrap_or_default(),
        })
    }

    pub fn has_ai(&self) -> bool {
        self.ollama.is_some()
    }
}

/// Deployment mode, read from `ENVIRONMENT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        *self == Self::Production
    }
}

impl FromStr for Environment {
    type Err = std::convert::Infallible;

    /// Unrecognised names fall back to development
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mode = match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "staging" | "stage" => Self::Staging,
            _ => Self::Development,
        };
        Ok(mode)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        })
    }
}

/// Value of `name`, failing when unset
pub fn env_required(name: &str) -> ConfigResult<String> {
    env::var(name).map_err(|_| ConfigError::missing(name))
}

/// Value of `name`, or `default` when unset
pub fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// `name` parsed as `T`, or `default` when unset
///
/// A set but unparsable value is an error rather than a silent default.
pub fn env_parse_or<T>(name: &str, default: T) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|e| ConfigError::invalid(name, e)),
        Err(_) => Ok(default),
    }
}
