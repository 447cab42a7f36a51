//! tunelink bot library
//!
//! Links chat users to their Spotify accounts and answers listening
//! commands. Exposed as a library so integration tests can drive the same
//! components the binary wires together.

pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use app::App;
pub use error::{BotError, BotResult};
