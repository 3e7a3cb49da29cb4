use async_trait::async_trait;

use crate::error::LLMError;

mod lexical;

pub use lexical::LexicalEmbedder;

/// Turns texts into dense vectors, one vector per input, in input order.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, input: Vec<String>) -> Result<Vec<Vec<f32>>, LLMError>;
}
