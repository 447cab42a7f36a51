//! Bot process configuration

use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result};
use tunelink_shared_config::{
    env_or, env_parse_or, CommonConfig, Environment, OllamaConfig, SpotifyConfig,
};

/// Default number of recommendations requested from the model
const DEFAULT_RECOMMENDATION_COUNT: usize = 5;

/// Upper bound on recommendations per `/recommend`
const MAX_RECOMMENDATION_COUNT: usize = 10;

/// Bot configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Common configuration shared with other services
    pub common: CommonConfig,

    /// Callback server bind address (default: 0.0.0.0)
    pub host: String,

    /// Callback server port (default: 8888)
    pub port: u16,

    /// Recommendations requested per `/recommend` (default: 5, clamped to 1..=10)
    pub recommendation_count: usize,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Missing Spotify credentials prevent startup. A missing `OLLAMA_URL`
    /// only disables the AI commands.
    pub fn from_env() -> Result<Self> {
        let common = CommonConfig::from_env().context("Failed to load config")?;

        let recommendation_count: usize =
            env_parse_or("RECOMMENDATION_COUNT", DEFAULT_RECOMMENDATION_COUNT)
                .context("Invalid RECOMMENDATION_COUNT value")?;

        Ok(Self {
            common,
            host: env_or("CALLBACK_HOST", "0.0.0.0"),
            port: env_parse_or("PORT", 8888).context("Invalid PORT value")?,
            recommendation_count: recommendation_count.clamp(1, MAX_RECOMMENDATION_COUNT),
        })
    }

    /// Address the callback server binds to
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .with_context(|| format!("Invalid CALLBACK_HOST value '{}'", self.host))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Get Spotify configuration
    pub fn spotify(&self) -> &SpotifyConfig {
        &self.common.spotify
    }

    /// Get Ollama configuration (if configured)
    pub fn ollama(&self) -> Option<&OllamaConfig> {
        self.common.ollama.as_ref()
    }

    /// Get environment mode
    pub fn environment(&self) -> Environment {
        self.common.environment
    }
}
