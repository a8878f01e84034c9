//! Cluster Orchestrator
//!
//! Combines the embedding provider, the incremental clusterer and the
//! representative selector over a batch of notes, and emits the grouping the
//! presentation layer consumes.

use crate::embedding::EmbeddingProvider;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::incremental::{cluster_by_threshold, DEFAULT_CLUSTER_THRESHOLD};
use super::representative::pick_representative;

/// A note to be clustered: external id plus the text to embed.
///
/// The text may be empty; the embedding provider embeds empty text
/// deterministically instead of failing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    /// External note id, owned by the caller's storage
    pub id: i64,

    /// Free text to embed (usually the note summary)
    pub text: String,
}

/// One semantic group in the clustering output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterResult {
    /// Sequential cluster id, starting at 1 in creation order.
    /// Only meaningful within the invocation that produced it.
    pub cluster_id: u32,

    /// External ids of the member notes, in insertion order
    pub insight_ids: Vec<i64>,

    /// The member text closest to the cluster centroid
    pub representative: Option<String>,
}

/// Clustering output in the shape the presentation layer consumes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClustersResponse {
    pub clusters: Vec<ClusterResult>,
}

/// Errors from the clustering pipeline
#[derive(Debug, Error)]
pub enum ClusterError {
    /// The input batch itself is malformed; nothing was embedded or clustered.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The embedding provider failed for the batch. A partial vector set
    /// would corrupt centroid arithmetic, so the whole batch fails; retry
    /// policy belongs to the caller.
    #[error("Embedding provider error: {0}")]
    Provider(#[from] anyhow::Error),

    /// Cancellation was observed mid-computation. No partial cluster set is
    /// ever returned.
    #[error("Clustering cancelled before completion")]
    Cancelled,
}

/// Orchestrates embedding, clustering and representative selection for a
/// batch of notes.
///
/// Each call starts from an empty cluster set over a snapshot of the input;
/// no centroid survives between invocations.
pub struct ClusterOrchestrator {
    provider: Arc<dyn EmbeddingProvider>,
    threshold: f32,
}

impl ClusterOrchestrator {
    /// Create an orchestrator with the default similarity threshold
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self::with_threshold(provider, DEFAULT_CLUSTER_THRESHOLD)
    }

    /// Create an orchestrator with a specific similarity threshold
    pub fn with_threshold(provider: Arc<dyn EmbeddingProvider>, threshold: f32) -> Self {
        Self { provider, threshold }
    }

    /// Cluster a batch of notes into semantic groups.
    ///
    /// The union of `insight_ids` across the returned clusters equals the
    /// input id set exactly, each id in exactly one cluster, and results are
    /// ordered by cluster creation. Re-running on the identical ordered input
    /// with a deterministic provider yields identical output.
    pub async fn cluster_notes(
        &self,
        notes: &[Note],
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<ClusterResult>, ClusterError> {
        if notes.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::with_capacity(notes.len());
        for note in notes {
            if !seen.insert(note.id) {
                return Err(ClusterError::InvalidInput(format!(
                    "Duplicate note id: {}",
                    note.id
                )));
            }
        }

        if let Some(token) = cancel {
            if token.is_cancelled() {
                return Err(ClusterError::Cancelled);
            }
        }

        let texts: Vec<String> = notes.iter().map(|n| n.text.clone()).collect();
        let vectors = self.provider.embed_batch(&texts).await?;

        if vectors.len() != notes.len() {
            return Err(ClusterError::Provider(anyhow::anyhow!(
                "Provider returned {} vectors for {} texts",
                vectors.len(),
                notes.len()
            )));
        }
        let dimension = self.provider.dimension();
        for (i, vec) in vectors.iter().enumerate() {
            if vec.len() != dimension {
                return Err(ClusterError::Provider(anyhow::anyhow!(
                    "Vector {} has dimension {}, expected {}",
                    i,
                    vec.len(),
                    dimension
                )));
            }
        }

        let clusters = cluster_by_threshold(&vectors, self.threshold, cancel)?;

        let results: Vec<ClusterResult> = clusters
            .iter()
            .map(|cluster| ClusterResult {
                cluster_id: cluster.id,
                insight_ids: cluster.members.iter().map(|&i| notes[i].id).collect(),
                representative: pick_representative(&cluster.members, &texts, &vectors),
            })
            .collect();

        tracing::debug!(
            "Clustered {} notes into {} clusters (threshold {})",
            notes.len(),
            results.len(),
            self.threshold
        );

        Ok(results)
    }

    /// Cluster parallel arrays of texts and ids, the shape upstream services
    /// tend to hand over. Ids default to 1..=n when not provided; a length
    /// mismatch is rejected before anything is embedded.
    pub async fn cluster_texts(
        &self,
        texts: &[String],
        ids: Option<&[i64]>,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<ClusterResult>, ClusterError> {
        let ids: Vec<i64> = match ids {
            Some(ids) => {
                if ids.len() != texts.len() {
                    return Err(ClusterError::InvalidInput(format!(
                        "Got {} ids for {} texts",
                        ids.len(),
                        texts.len()
                    )));
                }
                ids.to_vec()
            }
            None => (1..=texts.len() as i64).collect(),
        };

        let notes: Vec<Note> = ids
            .into_iter()
            .zip(texts.iter())
            .map(|(id, text)| Note {
                id,
                text: text.clone(),
            })
            .collect();

        self.cluster_notes(&notes, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbedder;

    fn orchestrator() -> ClusterOrchestrator {
        ClusterOrchestrator::new(Arc::new(HashEmbedder::new(64)))
    }

    #[tokio::test]
    async fn test_empty_input_yields_empty_output() {
        let results = orchestrator().cluster_notes(&[], None).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_ids_rejected() {
        let notes = vec![
            Note { id: 1, text: "a".to_string() },
            Note { id: 1, text: "b".to_string() },
        ];
        let result = orchestrator().cluster_notes(&notes, None).await;
        assert!(matches!(result, Err(ClusterError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_mismatched_parallel_arrays_rejected() {
        let texts = vec!["a".to_string(), "b".to_string()];
        let ids = vec![1_i64];
        let result = orchestrator().cluster_texts(&texts, Some(&ids), None).await;
        assert!(matches!(result, Err(ClusterError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_ids_default_to_sequence() {
        let texts = vec!["alpha".to_string(), "beta".to_string()];
        let results = orchestrator().cluster_texts(&texts, None, None).await.unwrap();

        let mut all_ids: Vec<i64> = results.iter().flat_map(|c| c.insight_ids.clone()).collect();
        all_ids.sort_unstable();
        assert_eq!(all_ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();

        let notes = vec![Note { id: 1, text: "a".to_string() }];
        let result = orchestrator().cluster_notes(&notes, Some(&token)).await;
        assert!(matches!(result, Err(ClusterError::Cancelled)));
    }
}
