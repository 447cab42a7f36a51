//! Stand-in Ollama server for the AI command tests

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tunelink_shared_config::OllamaConfig;

const GENERATE_PATH: &str = "/api/generate";
const CHAT_PATH: &str = "/api/chat";
const TAGS_PATH: &str = "/api/tags";

/// Wiremock server answering like a local Ollama
///
/// ```rust,ignore
/// let ollama = MockOllamaServer::start().await;
/// ollama.mock_chat_success("Mostly trip-hop this week.").await;
/// let client = OllamaClient::new(&ollama.config())?;
/// ```
pub struct MockOllamaServer {
    server: MockServer,
}

impl MockOllamaServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Client config for this server, with a 5s timeout
    pub fn config(&self) -> OllamaConfig {
        OllamaConfig {
            timeout_secs: 5,
            ..OllamaConfig::with_url(self.url())
        }
    }

    /// Escape hatch for one-off mocks
    pub fn inner(&self) -> &MockServer {
        &self.server
    }

    async fn respond(&self, verb: &str, endpoint: &str, template: ResponseTemplate) {
        Mock::given(method(verb))
            .and(path(endpoint))
            .respond_with(template)
            .mount(&self.server)
            .await;
    }

    /// `/api/generate` answers with `text`
    pub async fn mock_generate_success(&self, text: &str) {
        let body = json!({"model": "mistral", "response": text, "done": true});
        self.respond("POST", GENERATE_PATH, ResponseTemplate::new(200).set_body_json(body))
            .await;
    }

    /// `/api/generate` answers with `value` serialized as the completion
    pub async fn mock_generate_json(&self, value: Value) {
        self.mock_generate_success(&value.to_string()).await;
    }

    /// `/api/generate` fails with `status`
    pub async fn mock_generate_failure(&self, status: u16, error: &str) {
        let body = json!({ "error": error });
        self.respond("POST", GENERATE_PATH, ResponseTemplate::new(status).set_body_json(body))
            .await;
    }

    /// `/api/chat` answers with an assistant turn containing `text`
    pub async fn mock_chat_success(&self, text: &str) {
        let body = json!({
            "model": "mistral",
            "message": {"role": "assistant", "content": text},
            "done": true
        });
        self.respond("POST", CHAT_PATH, ResponseTemplate::new(200).set_body_json(body))
            .await;
    }

    /// `/api/tags` lists `names` as pulled models
    pub async fn mock_list_models(&self, names: &[&str]) {
        let models: Vec<Value> = names.iter().map(|name| json!({ "name": name })).collect();
        let body = json!({ "models": models });
        self.respond("GET", TAGS_PATH, ResponseTemplate::new(200).set_body_json(body))
            .await;
    }

    async fn calls_to(&self, endpoint: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == endpoint)
            .count()
    }

    pub async fn generate_calls(&self) -> usize {
        self.calls_to(GENERATE_PATH).await
    }

    pub async fn chat_calls(&self) -> usize {
        self.calls_to(CHAT_PATH).await
    }
}
