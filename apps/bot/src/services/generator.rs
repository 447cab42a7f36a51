//! Generative-text seam
//!
//! Commands only need "prompt in, text out". The trait keeps them independent
//! of Ollama so tests can substitute canned output.

use async_trait::async_trait;
use tunelink_ollama_client::{ChatMessage, OllamaClient};

use crate::error::BotResult;

/// Prompt-in, text-out generation
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Free-form completion for `prompt`
    async fn generate(&self, prompt: &str) -> BotResult<String>;

    /// Completion expected to contain JSON
    ///
    /// Backends with a JSON output mode should use it; the default is a
    /// plain completion.
    async fn generate_structured(&self, prompt: &str) -> BotResult<String> {
        self.generate(prompt).await
    }

    /// Completion for `prompt` framed by `system` instructions
    async fn generate_with_system(&self, system: &str, prompt: &str) -> BotResult<String> {
        self.generate(&format!("{}\n\n{}", system, prompt)).await
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str) -> BotResult<String> {
        Ok(OllamaClient::generate(self, prompt).await?)
    }

    async fn generate_structured(&self, prompt: &str) -> BotResult<String> {
        Ok(OllamaClient::generate_json(self, prompt).await?)
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> BotResult<String> {
        let messages = vec![ChatMessage::system(system), ChatMessage::user(prompt)];
        Ok(self.chat(messages).await?)
    }
}
