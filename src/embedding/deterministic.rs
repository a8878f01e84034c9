//! Deterministic stub provider for tests and offline use.

use anyhow::Result;
use async_trait::async_trait;

use super::EmbeddingProvider;

/// Embedding provider that derives a pseudo-random unit vector from a stable
/// hash of the text.
///
/// The same text always maps to the same vector within a build, which is all
/// the clustering and ranking logic needs to be exercised without downloading
/// a model. The vectors carry no semantic signal, so distinct texts rarely
/// land in the same cluster at realistic thresholds.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    /// Create a stub provider producing vectors of the given dimension
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};

        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        text.hash(&mut hasher);
        // Odd seed keeps the LCG on a full-period orbit.
        let mut state = hasher.finish() | 1;

        let mut vector = Vec::with_capacity(self.dimension);
        for _ in 0..self.dimension {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let unit = (state >> 40) as f32 / (1u64 << 24) as f32;
            vector.push(unit * 2.0 - 1.0);
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in vector.iter_mut() {
                *val /= norm;
            }
        } else if let Some(first) = vector.first_mut() {
            *first = 1.0;
        }

        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "hash-embedder"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_sync(t)).collect())
    }
}
