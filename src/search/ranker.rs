//! Similarity Search Ranker
//!
//! Scores candidate vectors against a query vector by cosine similarity and
//! returns them sorted best-first.

use crate::cluster::cosine_similarity;
use crate::embedding::EmbeddingProvider;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// A note offered for ranking. The vector is optional because storage may not
/// hold an embedding for every note yet.
#[derive(Debug, Clone)]
pub struct SearchCandidate {
    /// External note id
    pub id: i64,

    /// Display text carried through to the result
    pub summary: String,

    /// Persisted embedding, if any
    pub vector: Option<Vec<f32>>,
}

/// One ranked search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedResult {
    pub id: i64,
    pub summary: String,

    /// Cosine similarity to the query, in [-1, 1]
    pub score: f32,
}

/// Ranking output, including how many candidates could not participate
#[derive(Debug, Clone)]
pub struct RankedSearch {
    /// Results sorted by score descending; ties keep input order
    pub results: Vec<RankedResult>,

    /// Candidates excluded because they carried no vector. Surfaced so
    /// callers can distinguish a thin result set from missing data.
    pub skipped_missing_vector: usize,
}

/// Search output in the shape the presentation layer consumes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<RankedResult>,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Embedding error: {0}")]
    Embedding(#[from] anyhow::Error),
}

/// Rank candidates against a query vector by cosine similarity.
///
/// Candidates without a vector are excluded and counted in
/// `skipped_missing_vector`. A zero-norm query or candidate scores 0.0
/// rather than producing NaN, so the sort is always well defined. The sort
/// is stable: equal scores keep their relative input order. An empty
/// candidate list yields an empty result list.
pub fn rank_candidates(query_vector: &[f32], candidates: Vec<SearchCandidate>) -> RankedSearch {
    let mut skipped = 0;
    let mut results: Vec<RankedResult> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let Some(vector) = candidate.vector else {
            skipped += 1;
            continue;
        };

        let score = cosine_similarity(query_vector, &vector);
        results.push(RankedResult {
            id: candidate.id,
            summary: candidate.summary,
            score,
        });
    }

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    RankedSearch {
        results,
        skipped_missing_vector: skipped,
    }
}

/// Semantic search over note candidates: embeds the query text, then ranks.
pub struct SearchEngine {
    provider: Arc<dyn EmbeddingProvider>,
}

impl SearchEngine {
    /// Create a search engine on top of an embedding provider
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    /// Embed `query` and rank `candidates` against it
    pub async fn search(
        &self,
        query: &str,
        candidates: Vec<SearchCandidate>,
    ) -> Result<SearchResponse, SearchError> {
        let query_vector = self
            .provider
            .embed(query)
            .await
            .context("Failed to embed query")?;

        let ranked = rank_candidates(&query_vector, candidates);
        if ranked.skipped_missing_vector > 0 {
            tracing::warn!(
                "Search skipped {} candidates without stored vectors",
                ranked.skipped_missing_vector
            );
        }

        Ok(SearchResponse {
            query: query.to_string(),
            results: ranked.results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: i64, summary: &str, vector: Option<Vec<f32>>) -> SearchCandidate {
        SearchCandidate {
            id,
            summary: summary.to_string(),
            vector,
        }
    }

    #[test]
    fn test_identical_vector_scores_one() {
        let query = vec![0.3, 0.4, 0.5];
        let ranked = rank_candidates(&query, vec![candidate(1, "same", Some(query.clone()))]);

        assert_eq!(ranked.results.len(), 1);
        assert!((ranked.results[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_candidates_yield_empty_results() {
        let ranked = rank_candidates(&[1.0, 0.0], Vec::new());
        assert!(ranked.results.is_empty());
        assert_eq!(ranked.skipped_missing_vector, 0);
    }

    #[test]
    fn test_sorted_descending() {
        let query = vec![1.0, 0.0];
        let ranked = rank_candidates(
            &query,
            vec![
                candidate(1, "far", Some(vec![0.0, 1.0])),
                candidate(2, "near", Some(vec![1.0, 0.1])),
                candidate(3, "opposite", Some(vec![-1.0, 0.0])),
            ],
        );

        let ids: Vec<i64> = ranked.results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert!(ranked.results[0].score > ranked.results[1].score);
        assert!(ranked.results[1].score > ranked.results[2].score);
    }

    #[test]
    fn test_missing_vectors_excluded_and_counted() {
        let query = vec![1.0, 0.0];
        let ranked = rank_candidates(
            &query,
            vec![
                candidate(1, "no vector", None),
                candidate(2, "has vector", Some(vec![1.0, 0.0])),
                candidate(3, "also missing", None),
            ],
        );

        assert_eq!(ranked.results.len(), 1);
        assert_eq!(ranked.results[0].id, 2);
        assert_eq!(ranked.skipped_missing_vector, 2);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let query = vec![1.0, 0.0];
        let shared = vec![1.0, 0.0];
        let ranked = rank_candidates(
            &query,
            vec![
                candidate(10, "first", Some(shared.clone())),
                candidate(20, "second", Some(shared.clone())),
                candidate(30, "third", Some(shared)),
            ],
        );

        let ids: Vec<i64> = ranked.results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }

    #[test]
    fn test_zero_norm_query_scores_zero() {
        let ranked = rank_candidates(
            &[0.0, 0.0],
            vec![candidate(1, "anything", Some(vec![1.0, 0.0]))],
        );
        assert_eq!(ranked.results[0].score, 0.0);
    }

    #[test]
    fn test_scores_stay_in_range() {
        let query = vec![0.1, 0.2, 0.3];
        let ranked = rank_candidates(
            &query,
            vec![
                candidate(1, "aligned", Some(vec![0.1, 0.2, 0.3])),
                candidate(2, "inverted", Some(vec![-0.1, -0.2, -0.3])),
            ],
        );

        for result in &ranked.results {
            assert!(result.score >= -1.0 && result.score <= 1.0);
        }
    }
}
