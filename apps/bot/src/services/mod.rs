//! Business logic services
//!
//! This module contains the token lifecycle, the request gateway and the
//! recommendation pipeline the command handlers are built on.

pub mod callback;
pub mod gateway;
pub mod generator;
pub mod recommendations;
pub mod refresher;
pub mod token_store;

pub use callback::{CallbackHandler, CallbackParams, CallbackResult};
pub use gateway::{ApiOutcome, RequestGateway};
pub use generator::TextGenerator;
pub use recommendations::{hydrate, Candidate, HydratedRecommendation};
pub use refresher::TokenRefresher;
pub use token_store::{InMemoryTokenStore, TokenRecord, TokenStore, UserId};
