//! Semantic clustering of note embeddings

pub mod incremental;
pub mod orchestrator;
pub mod representative;

pub use incremental::{
    centroid_of, cluster_by_threshold, cosine_similarity, Cluster, DEFAULT_CLUSTER_THRESHOLD,
};
pub use orchestrator::{ClusterError, ClusterOrchestrator, ClusterResult, ClustersResponse, Note};
pub use representative::pick_representative;
