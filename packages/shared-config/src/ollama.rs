//! Ollama connection settings

use std::env;

use crate::{env_or, env_parse_or, ConfigResult};

const DEFAULT_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "mistral";

/// Where and how to reach the Ollama server
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Base URL, e.g. `http://localhost:11434`
    pub url: String,
    /// Model tag passed with every request
    pub model: String,
    pub timeout_secs: u64,
    /// Completion length cap (`num_predict`)
    pub max_tokens: u32,
    pub temperature: f32,
}

impl OllamaConfig {
    /// Read `OLLAMA_*`; only `OLLAMA_URL` decides whether AI is enabled
    pub fn from_env_optional() -> ConfigResult<Option<Self>> {
        let url = match env::var("OLLAMA_URL") {
            Ok(url) if !url.trim().is_empty() => url,
            _ => return Ok(None),
        };

        Ok(Some(Self {
            url,
            model: env_or("OLLAMA_MODEL", DEFAULT_MODEL),
            timeout_secs: env_parse_or("OLLAMA_TIMEOUT", 60)?,
            max_tokens: env_parse_or("OLLAMA_MAX_TOKENS", 1024)?,
            temperature: env_parse_or("OLLAMA_TEMPERATURE", 0.7)?,
        }))
    }

    /// Defaults pointed at `url`
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.url.trim_end_matches('/'), path)
    }

    pub fn generate_url(&self) -> String {
        self.endpoint("/api/generate")
    }

    pub fn chat_url(&self) -> String {
        self.endpoint("/api/chat")
    }

    pub fn tags_url(&self) -> String {
        self.endpoint("/api/tags")
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 60,
            max_tokens: 1024,
            temperature: 0.7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_ignore_trailing_slash() {
        let config = OllamaConfig::with_url("http://ollama:11434/");
        assert_eq!(config.generate_url(), "http://ollama:11434/api/generate");
        assert_eq!(config.chat_url(), "http://ollama:11434/api/chat");
        assert_eq!(config.tags_url(), "http://ollama:11434/api/tags");
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_unset_url_disables_ai() {
        temp_env::with_var_unset("OLLAMA_URL", || {
            assert!(OllamaConfig::from_env_optional().unwrap().is_none());
        });
        temp_env::with_var("OLLAMA_URL", Some("  "), || {
            assert!(OllamaConfig::from_env_optional().unwrap().is_none());
        });
    }

    #[test]
    fn test_overrides_are_read() {
        temp_env::with_vars(
            [
                ("OLLAMA_URL", Some("http://gpu-box:11434")),
                ("OLLAMA_MODEL", Some("llama3")),
                ("OLLAMA_TIMEOUT", Some("15")),
            ],
            || {
                let config = OllamaConfig::from_env_optional().unwrap().unwrap();
                assert_eq!(config.url, "http://gpu-box:11434");
                assert_eq!(config.model, "llama3");
                assert_eq!(config.timeout_secs, 15);
            },
        );
    }

    #[test]
    fn test_bad_timeout_is_rejected() {
        temp_env::with_vars(
            [
                ("OLLAMA_URL", Some("http://gpu-box:11434")),
                ("OLLAMA_TIMEOUT", Some("soon")),
            ],
            || {
                assert!(OllamaConfig::from_env_optional().is_err());
            },
        );
    }
}
