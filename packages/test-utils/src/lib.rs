//! Shared test utilities for tunelink workspace
//!
//! This crate provides mock implementations of external services for testing
//! without network dependencies.
//!
//! # Mock Services
//!
//! - [`MockSpotifyServer`] - Mock accounts service + Web API with request counters
//! - [`MockOllamaServer`] - Mock Ollama LLM server for generation tests
//!
//! # Example
//!
//! ```rust,ignore
//! use tunelink_test_utils::{track_json, MockSpotifyServer};
//!
//! #[tokio::test]
//! async fn test_with_mocks() {
//!     let spotify = MockSpotifyServer::start().await;
//!     spotify.mock_currently_playing("A1", track_json("Teardrop", "Massive Attack")).await;
//!
//!     // Configure your clients with spotify.config()
//! }
//! ```

mod ollama;
mod spotify;

pub use ollama::MockOllamaServer;
pub use spotify::{track_json, MockSpotifyServer};
