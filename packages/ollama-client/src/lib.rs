//! Ollama client used by the tunelink AI commands
//!
//! Requests are non-streaming. Transient failures (timeouts, refused
//! connections) are retried with exponential backoff; anything else
//! surfaces immediately.
//!
//! ```no_run
//! use tunelink_ollama_client::{ChatMessage, OllamaClient};
//! use tunelink_shared_config::OllamaConfig;
//!
//! # async fn demo() -> Result<(), tunelink_ollama_client::OllamaError> {
//! let client = OllamaClient::new(&OllamaConfig::default())?;
//! let summary = client
//!     .chat(vec![
//!         ChatMessage::system("You describe music taste."),
//!         ChatMessage::user("Top tracks: Roads by Portishead"),
//!     ])
//!     .await?;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod models;

pub use client::OllamaClient;
pub use error::{OllamaError, OllamaResult};
pub use models::{
    ChatMessage, ChatRequest, ChatResponse, ChatRole, GenerateRequest, GenerateResponse,
    ModelOptions, ModelTag, TagsResponse,
};
