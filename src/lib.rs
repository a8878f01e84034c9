//! Insight Engine - semantic clustering and search for personal notes
//!
//! The engine groups free-text notes into semantic clusters and ranks notes
//! against a query by cosine similarity over their embedding vectors.
//!
//! # Architecture
//!
//! - **Embedding seam**: text is turned into vectors by an injected
//!   [`embedding::EmbeddingProvider`], so the clustering and ranking logic can
//!   be tested without loading any model
//! - **Incremental clustering**: a single ordered pass assigns each vector to
//!   the most similar cluster centroid above a threshold, or opens a new
//!   cluster; centroids are exact running means
//! - **Representative selection**: each finished cluster is summarized by the
//!   member text closest to the cluster mean
//! - **Similarity ranking**: candidates are scored against a query vector and
//!   returned best-first
//!
//! Clustering state is request-scoped: every invocation starts from an empty
//! cluster set and the resulting cluster ids are only valid for that output.
//!
//! # Example
//!
//! ```rust,no_run
//! use insight_engine::cluster::{ClusterOrchestrator, Note};
//! use insight_engine::embedding::HashEmbedder;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), insight_engine::cluster::ClusterError> {
//! let orchestrator = ClusterOrchestrator::new(Arc::new(HashEmbedder::new(384)));
//! let notes = vec![
//!     Note { id: 1, text: "morning run felt great".to_string() },
//!     Note { id: 2, text: "ran five kilometers today".to_string() },
//! ];
//! let clusters = orchestrator.cluster_notes(&notes, None).await?;
//! # Ok(())
//! # }
//! ```

pub mod cluster;
pub mod config;
pub mod embedding;
pub mod search;

pub use cluster::{ClusterError, ClusterOrchestrator, ClusterResult, ClustersResponse, Note};
pub use config::EngineConfig;
pub use embedding::{EmbeddingProvider, FastEmbedProvider, HashEmbedder};
pub use search::{SearchCandidate, SearchEngine, SearchResponse};
