//! HTTP client for the Ollama API

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use tunelink_shared_config::OllamaConfig;

use crate::error::{OllamaError, OllamaResult};
use crate::models::{
    ChatMessage, ChatRequest, ChatResponse, GenerateRequest, GenerateResponse, ModelOptions,
    TagsResponse,
};

/// Error bodies longer than this are cut before they reach logs
const ERROR_BODY_LIMIT: usize = 1000;

/// Backoff between attempts on transient failures
#[derive(Debug, Clone, Copy)]
struct RetryPolicy {
    attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// Doubles per attempt: base, 2*base, 4*base...
    fn delay_before(&self, retry: u32) -> Duration {
        self.base_delay * 2_u32.saturating_pow(retry)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Ollama client shared by every command task
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    config: OllamaConfig,
    retry: RetryPolicy,
}

impl OllamaClient {
    pub fn new(config: &OllamaConfig) -> OllamaResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(4)
            .build()?;

        Ok(Self {
            http,
            config: config.clone(),
            retry: RetryPolicy::default(),
        })
    }

    /// Override attempt count and initial backoff
    pub fn with_retry_config(mut self, attempts: u32, base_delay_ms: u64) -> Self {
        self.retry = RetryPolicy {
            attempts: attempts.max(1),
            base_delay: Duration::from_millis(base_delay_ms),
        };
        self
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// True when the server answers on `/api/tags`
    pub async fn health_check(&self) -> OllamaResult<bool> {
        let response = self
            .http
            .get(self.config.tags_url())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Ok(response.status().is_success())
    }

    /// Whether the configured model is pulled, ignoring `:tag` suffixes
    pub async fn has_model(&self) -> OllamaResult<bool> {
        let tags: TagsResponse = self.send(self.http.get(self.config.tags_url())).await?;
        let wanted = self.config.model.split(':').next().unwrap_or(&self.config.model);
        Ok(tags.models.iter().any(|tag| tag.base_name() == wanted))
    }

    /// Free-form completion
    pub async fn generate(&self, prompt: &str) -> OllamaResult<String> {
        self.complete(prompt, None).await
    }

    /// Completion constrained to one JSON value
    ///
    /// Only the syntax is constrained; the shape still needs validating.
    pub async fn generate_json(&self, prompt: &str) -> OllamaResult<String> {
        self.complete(prompt, Some("json")).await
    }

    /// One assistant reply to `messages`
    pub async fn chat(&self, messages: Vec<ChatMessage>) -> OllamaResult<String> {
        debug!(model = %self.config.model, turns = messages.len(), "Ollama chat");

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages,
            stream: false,
            options: Some(self.options()),
        };

        let response: ChatResponse = self
            .retrying(|| self.send(self.http.post(self.config.chat_url()).json(&request)))
            .await?;
        non_empty(response.message.content)
    }

    async fn complete(&self, prompt: &str, format: Option<&str>) -> OllamaResult<String> {
        debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            json = format.is_some(),
            "Ollama generate"
        );

        let request = GenerateRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            format: format.map(str::to_string),
            options: Some(self.options()),
        };

        let response: GenerateResponse = self
            .retrying(|| self.send(self.http.post(self.config.generate_url()).json(&request)))
            .await?;
        non_empty(response.response)
    }

    fn options(&self) -> ModelOptions {
        ModelOptions {
            temperature: Some(self.config.temperature),
            num_predict: Some(self.config.max_tokens),
        }
    }

    async fn retrying<T, F, Fut>(&self, attempt: F) -> OllamaResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = OllamaResult<T>>,
    {
        let mut retry = 0;
        loop {
            let error = match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => e,
            };

            if retry + 1 >= self.retry.attempts {
                return Err(OllamaError::RetriesExhausted {
                    attempts: self.retry.attempts,
                    last_error: error.to_string(),
                });
            }

            let delay = self.retry.delay_before(retry);
            warn!(
                attempt = retry + 1,
                of = self.retry.attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Transient Ollama failure, backing off"
            );
            tokio::time::sleep(delay).await;
            retry += 1;
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> OllamaResult<T> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let response = self.check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn check_status(&self, response: Response) -> OllamaResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = clip(response.text().await.unwrap_or_default());
        if body.contains("not found") && body.contains("model") {
            return Err(OllamaError::ModelNotFound(self.config.model.clone()));
        }
        Err(OllamaError::Api {
            status: status.as_u16(),
            body,
        })
    }

    fn transport_error(&self, error: reqwest::Error) -> OllamaError {
        if error.is_connect() {
            OllamaError::Unreachable(self.config.url.clone())
        } else if error.is_timeout() {
            OllamaError::Timeout(self.config.timeout_secs)
        } else {
            OllamaError::Http(error)
        }
    }
}

fn non_empty(text: String) -> OllamaResult<String> {
    if text.trim().is_empty() {
        Err(OllamaError::EmptyResponse)
    } else {
        Ok(text)
    }
}

/// Cut `body` to at most [`ERROR_BODY_LIMIT`] bytes on a char boundary
fn clip(mut body: String) -> String {
    if body.len() <= ERROR_BODY_LIMIT {
        return body;
    }
    let mut end = ERROR_BODY_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body.truncate(end);
    body.push_str("...");
    body
}
