//! Similarity-ranked retrieval over note embeddings

pub mod ranker;

pub use ranker::{
    rank_candidates, RankedResult, RankedSearch, SearchCandidate, SearchEngine, SearchError,
    SearchResponse,
};
