use async_trait::async_trait;

use super::EmbeddingProvider;
use crate::error::LLMError;

const DEFAULT_DIMENSIONS: usize = 1024;
const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Offline embedder built from hashed word and character-trigram features.
///
/// It has no notion of meaning beyond surface overlap, but it is deterministic
/// and needs no model download, which makes it suitable for smoke runs of the
/// evaluator and for tests. Output vectors are L2-normalised; empty input maps
/// to the zero vector.
#[derive(Debug, Clone)]
pub struct LexicalEmbedder {
    dimensions: usize,
}

impl Default for LexicalEmbedder {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_DIMENSIONS,
        }
    }
}

impl LexicalEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let lowered = text.to_lowercase();

        for word in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            self.accumulate(&mut vector, word.as_bytes(), WORD_WEIGHT);

            let padded: Vec<char> = std::iter::once('^')
                .chain(word.chars())
                .chain(std::iter::once('$'))
                .collect();
            for window in padded.windows(3) {
                let gram: String = window.iter().collect();
                self.accumulate(&mut vector, gram.as_bytes(), TRIGRAM_WEIGHT);
            }
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }

    fn accumulate(&self, vector: &mut [f32], feature: &[u8], weight: f32) {
        let index = (fnv1a(feature) % self.dimensions as u64) as usize;
        vector[index] += weight;
    }
}

// Stable across runs and platforms, unlike the std hasher.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

#[async_trait]
impl EmbeddingProvider for LexicalEmbedder {
    async fn embed(&self, input: Vec<String>) -> Result<Vec<Vec<f32>>, LLMError> {
        Ok(input.iter().map(|text| self.embed_text(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_identical_text_is_identical_vector() {
        let embedder = LexicalEmbedder::new();
        let a = embedder.embed_text("Your eSIM has been activated.");
        let b = embedder.embed_text("Your eSIM has been activated.");
        assert_eq!(a, b);
        assert!((dot(&a, &b) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_case_is_ignored() {
        let embedder = LexicalEmbedder::new();
        let a = embedder.embed_text("Roaming ENABLED");
        let b = embedder.embed_text("roaming enabled");
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = LexicalEmbedder::with_dimensions(16);
        let v = embedder.embed_text("  ...  ");
        assert_eq!(v.len(), 16);
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_unrelated_text_scores_low() {
        let embedder = LexicalEmbedder::new();
        let a = embedder.embed_text("Your package was changed to Gold Unlimited.");
        let b = embedder.embed_text("Tomorrow brings heavy rainfall over Oslo.");
        assert!(dot(&a, &b) < 0.3);
    }

    #[tokio::test]
    async fn test_embed_preserves_order() {
        let embedder = LexicalEmbedder::new();
        let out = embedder
            .embed(vec!["first".to_string(), "second".to_string()])
            .await
            .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], embedder.embed_text("first"));
        assert_eq!(out[1], embedder.embed_text("second"));
    }
}
