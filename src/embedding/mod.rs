//! Embedding Module
//!
//! Defines the narrow seam to the external embedding model and provides two
//! implementations: [`FastEmbedProvider`] for real local inference via
//! FastEmbed (ONNX) and [`HashEmbedder`], a deterministic stub that needs no
//! model download.

use anyhow::{Context, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::EmbeddingConfig;

pub mod deterministic;

pub use deterministic::HashEmbedder;

/// Default embedding model
const DEFAULT_MODEL: EmbeddingModel = EmbeddingModel::AllMiniLML6V2;

/// Embedding dimension for AllMiniLML6V2
pub const EMBEDDING_DIMENSION: usize = 384;

/// Default number of cached embeddings
const DEFAULT_CACHE_SIZE: usize = 1000;

/// Maps text to a fixed-length dense vector.
///
/// Implementations must be deterministic for a fixed model version and must
/// embed empty text without failing (the clustering pipeline feeds it notes
/// whose summary may be blank).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Dimension of the produced vectors
    fn dimension(&self) -> usize;

    /// Identifier of the underlying model
    fn model_name(&self) -> &str;

    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed multiple texts, order-preserving: the i-th vector corresponds to
    /// the i-th input text.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Embedding provider backed by FastEmbed local inference
pub struct FastEmbedProvider {
    model: Arc<RwLock<TextEmbedding>>,
    cache: Arc<RwLock<LruCache<String, Vec<f32>>>>,
    model_name: String,
    dimension: usize,
}

impl FastEmbedProvider {
    /// Create a provider with the default model
    pub async fn new() -> Result<Self> {
        Self::with_model(DEFAULT_MODEL, EMBEDDING_DIMENSION, DEFAULT_CACHE_SIZE).await
    }

    /// Create a provider from an embedding configuration
    pub async fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let model = match config.model.as_str() {
            "all-MiniLM-L6-v2" => EmbeddingModel::AllMiniLML6V2,
            "bge-small-en-v1.5" => EmbeddingModel::BGESmallENV15,
            other => anyhow::bail!("Unsupported embedding model: {}", other),
        };
        Self::with_model(model, config.dimension, config.cache_size).await
    }

    /// Create a provider with a specific model
    pub async fn with_model(
        embedding_model: EmbeddingModel,
        dimension: usize,
        cache_size: usize,
    ) -> Result<Self> {
        let model_name = format!("{:?}", embedding_model);

        let init_options = InitOptions::new(embedding_model);

        let model = tokio::task::spawn_blocking(move || TextEmbedding::try_new(init_options))
            .await
            .context("Failed to spawn blocking task")?
            .context("Failed to initialize embedding model")?;

        let cache_size = NonZeroUsize::new(cache_size)
            .unwrap_or_else(|| NonZeroUsize::new(DEFAULT_CACHE_SIZE).unwrap());
        let cache = LruCache::new(cache_size);

        Ok(Self {
            model: Arc::new(RwLock::new(model)),
            cache: Arc::new(RwLock::new(cache)),
            model_name,
            dimension,
        })
    }

    /// Get cache statistics as (used, capacity)
    pub async fn cache_stats(&self) -> (usize, usize) {
        let cache = self.cache.read().await;
        (cache.len(), cache.cap().get())
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        // Check cache first
        {
            let mut cache = self.cache.write().await;
            if let Some(cached) = cache.get(text) {
                return Ok(cached.clone());
            }
        }

        let text_owned = text.to_string();
        let model = self.model.clone();

        let embeddings = tokio::task::spawn_blocking(move || {
            let model_guard = futures::executor::block_on(model.read());
            model_guard.embed(vec![text_owned], None)
        })
        .await
        .context("Failed to spawn blocking task")?
        .context("Failed to generate embedding")?;

        if embeddings.is_empty() {
            anyhow::bail!("No embedding generated");
        }

        let embedding = embeddings[0].clone();

        {
            let mut cache = self.cache.write().await;
            cache.put(text.to_string(), embedding.clone());
        }

        Ok(embedding)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut results = Vec::with_capacity(texts.len());
        let mut to_embed = Vec::new();
        let mut to_embed_indices = Vec::new();

        // Check cache for each text
        {
            let mut cache = self.cache.write().await;
            for (i, text) in texts.iter().enumerate() {
                if let Some(cached) = cache.get(text) {
                    results.push(cached.clone());
                } else {
                    to_embed.push(text.clone());
                    to_embed_indices.push(i);
                    results.push(Vec::new()); // Placeholder
                }
            }
        }

        // Embed texts that weren't in cache
        if !to_embed.is_empty() {
            let model = self.model.clone();
            let to_embed_copy = to_embed.clone();

            let embeddings = tokio::task::spawn_blocking(move || {
                let model_guard = futures::executor::block_on(model.read());
                model_guard.embed(to_embed_copy, None)
            })
            .await
            .context("Failed to spawn blocking task")?
            .context("Failed to generate embeddings")?;

            {
                let mut cache = self.cache.write().await;
                for (i, embedding) in embeddings.into_iter().enumerate() {
                    let text = &to_embed[i];
                    let idx = to_embed_indices[i];

                    cache.put(text.clone(), embedding.clone());
                    results[idx] = embedding;
                }
            }
        }

        Ok(results)
    }
}

/// Convert an embedding to the little-endian byte layout the storage layer
/// persists vectors in
pub fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert a persisted blob back to an embedding
pub fn blob_to_embedding(blob: &[u8]) -> Result<Vec<f32>> {
    if blob.len() % 4 != 0 {
        anyhow::bail!("Invalid blob size for f32 array");
    }

    let mut embedding = Vec::with_capacity(blob.len() / 4);
    for chunk in blob.chunks_exact(4) {
        let bytes: [u8; 4] = chunk.try_into().context("Invalid chunk size")?;
        embedding.push(f32::from_le_bytes(bytes));
    }

    Ok(embedding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_serialization() {
        let original = vec![1.0, 2.5, -3.7, 0.0, 4.2];
        let blob = embedding_to_blob(&original);
        let restored = blob_to_embedding(&blob).unwrap();

        assert_eq!(original, restored);
    }

    #[test]
    fn test_blob_invalid_length_rejected() {
        let blob = vec![0u8, 1, 2];
        assert!(blob_to_embedding(&blob).is_err());
    }

    #[tokio::test]
    #[ignore] // Downloads the ONNX model on first run
    async fn test_fastembed_provider() {
        let provider = FastEmbedProvider::new().await.unwrap();

        let embedding = provider.embed("This is a test sentence").await.unwrap();
        assert_eq!(embedding.len(), EMBEDDING_DIMENSION);

        let texts = vec!["First sentence".to_string(), "Second sentence".to_string()];
        let embeddings = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(embeddings.len(), 2);
    }

    #[tokio::test]
    #[ignore] // Downloads the ONNX model on first run
    async fn test_fastembed_cache() {
        let provider = FastEmbedProvider::new().await.unwrap();

        let emb1 = provider.embed("Cached text").await.unwrap();
        let emb2 = provider.embed("Cached text").await.unwrap();
        assert_eq!(emb1, emb2);

        let (used, capacity) = provider.cache_stats().await;
        assert_eq!(used, 1);
        assert!(capacity > 0);
    }
}
