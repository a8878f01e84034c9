//! Incremental nearest-centroid clustering over embedding vectors.
//!
//! Greedy single-pass algorithm (no k-means): vectors are processed strictly
//! in input order and either join the most similar existing cluster or open a
//! new one. O(n * k) with k clusters formed so far, no spatial index, which is
//! fine for the few thousand notes a personal collection holds.

use tokio_util::sync::CancellationToken;

use super::orchestrator::ClusterError;

/// Default similarity threshold for joining an existing cluster
pub const DEFAULT_CLUSTER_THRESHOLD: f32 = 0.65;

/// A cluster formed during a single clustering pass.
///
/// Clusters live in an append-only sequence: ids are assigned sequentially
/// starting at 1 in creation order and are only meaningful within the
/// invocation that produced them.
#[derive(Debug, Clone)]
pub struct Cluster {
    /// Sequential id, starting at 1 in creation order
    pub id: u32,

    /// Arithmetic mean of all member vectors, recomputed on every insertion
    pub centroid: Vec<f32>,

    /// Indices into the input vector sequence, in insertion order
    pub members: Vec<usize>,
}

/// Cosine similarity between two vectors, clamped to [-1, 1].
///
/// Returns 0.0 when either vector has zero norm or the lengths differ, so a
/// degenerate input can never surface as NaN in a comparison.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }

    (dot / (na * nb)).clamp(-1.0, 1.0)
}

/// Calculate the centroid (arithmetic mean) of a set of vectors
pub fn centroid_of(vectors: &[&[f32]]) -> Vec<f32> {
    if vectors.is_empty() {
        return Vec::new();
    }

    let dim = vectors[0].len();
    let mut centroid = vec![0.0; dim];

    for vec in vectors {
        for (i, val) in vec.iter().enumerate() {
            centroid[i] += val;
        }
    }

    let n = vectors.len() as f32;
    for val in centroid.iter_mut() {
        *val /= n;
    }

    centroid
}

/// Partition vectors into clusters with a single incremental pass.
///
/// The first vector seeds cluster 1. Each subsequent vector is compared
/// against every existing centroid; if the best similarity reaches
/// `threshold` (comparison is `>=`, so a pair sitting exactly on the
/// threshold joins) it is added to that cluster and the centroid is
/// recomputed as the mean of all members including it, otherwise it opens a
/// new cluster. On equal best similarity the earliest-created cluster wins.
///
/// Later assignments depend on earlier centroid updates, so the pass is
/// inherently sequential. The optional `cancel` token is checked once per
/// vector; cancellation aborts with [`ClusterError::Cancelled`] and no
/// partial cluster set is returned.
///
/// An empty input yields an empty cluster set, not an error.
pub fn cluster_by_threshold(
    vectors: &[Vec<f32>],
    threshold: f32,
    cancel: Option<&CancellationToken>,
) -> Result<Vec<Cluster>, ClusterError> {
    let mut clusters: Vec<Cluster> = Vec::new();

    for (i, emb) in vectors.iter().enumerate() {
        if let Some(token) = cancel {
            if token.is_cancelled() {
                return Err(ClusterError::Cancelled);
            }
        }

        if clusters.is_empty() {
            clusters.push(Cluster {
                id: 1,
                centroid: emb.clone(),
                members: vec![i],
            });
            continue;
        }

        // Strict > keeps the first maximum, so ties go to the earliest cluster.
        let mut best_idx = 0;
        let mut best_sim = f32::NEG_INFINITY;
        for (ci, cluster) in clusters.iter().enumerate() {
            let sim = cosine_similarity(&cluster.centroid, emb);
            if sim > best_sim {
                best_sim = sim;
                best_idx = ci;
            }
        }

        if best_sim >= threshold {
            let cluster = &mut clusters[best_idx];
            cluster.members.push(i);
            let member_vecs: Vec<&[f32]> = cluster
                .members
                .iter()
                .map(|&m| vectors[m].as_slice())
                .collect();
            cluster.centroid = centroid_of(&member_vecs);
        } else {
            let id = clusters.len() as u32 + 1;
            clusters.push(Cluster {
                id,
                centroid: emb.clone(),
                members: vec![i],
            });
        }
    }

    Ok(clusters)
}
