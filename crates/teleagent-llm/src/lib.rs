//! Model boundary for the operator agent.
//!
//! The agent core only ever talks to a language model through [`ChatProvider`]
//! and to an embedding model through [`EmbeddingProvider`]. Concrete
//! transports live under [`backends`].

pub mod backends;
pub mod builder;
pub mod chat;
pub mod embedding;
pub mod error;

pub use chat::{ChatMessage, ChatProvider, ChatResponse, ChatRole, TextResponse};
pub use embedding::EmbeddingProvider;
pub use error::LLMError;

/// A backend able to both chat and embed.
pub trait LLMProvider: ChatProvider + EmbeddingProvider {}
