use std::sync::Arc;

use teleagent_llm::{EmbeddingProvider, LLMError};

/// Normalised cosine of two embeddings; 0 when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm = |v: &[f32]| v.iter().map(|x| x * x).sum::<f32>().sqrt();
    let (norm_a, norm_b) = (norm(a), norm(b));
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Scores a predicted final answer against its gold counterpart.
#[derive(Clone)]
pub struct SemanticScorer {
    embedder: Arc<dyn EmbeddingProvider>,
    threshold: f32,
}

impl SemanticScorer {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, threshold: f32) -> Self {
        Self {
            embedder,
            threshold,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Cosine similarity of the two texts' embeddings.
    pub async fn similarity(&self, gold: &str, predicted: &str) -> Result<f32, LLMError> {
        let embeddings = self
            .embedder
            .embed(vec![gold.to_string(), predicted.to_string()])
            .await?;

        match embeddings.as_slice() {
            [a, b] => Ok(cosine_similarity(a, b)),
            other => Err(LLMError::ProviderError(format!(
                "expected 2 embeddings, got {}",
                other.len()
            ))),
        }
    }

    pub fn passes(&self, similarity: f32) -> bool {
        similarity >= self.threshold
    }
}
