//! Vector index abstraction
//!
//! The searcher only needs nearest-neighbour lookup with an optional
//! payload filter. [`QdrantStore`](crate::client::QdrantStore) implements it
//! against a live collection; tests use an in-memory index.

use async_trait::async_trait;
use fastener_core::{FilterSpec, SearchCandidate};

use crate::error::Result;

/// A nearest-neighbour request
#[derive(Debug, Clone)]
pub struct VectorQuery {
    /// Query embedding
    pub vector: Vec<f32>,
    /// Maximum number of candidates to return
    pub limit: u64,
    /// Payload constraints; `None` searches the whole collection
    pub filter: Option<FilterSpec>,
    /// Candidates scoring below this are dropped by the index
    pub score_threshold: Option<f32>,
}

impl VectorQuery {
    pub fn new(vector: Vec<f32>, limit: u64) -> Self {
        Self {
            vector,
            limit,
            filter: None,
            score_threshold: None,
        }
    }

    /// Attach a filter. Empty filters are dropped.
    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filter = if filter.is_empty() { None } else { Some(filter) };
        self
    }

    pub fn with_score_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = Some(threshold);
        self
    }

    /// Same query without payload constraints
    pub fn unfiltered(&self) -> Self {
        Self {
            filter: None,
            ..self.clone()
        }
    }
}

/// Nearest-neighbour search over product chunks
///
/// Results come back ordered by descending similarity.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn search(&self, query: VectorQuery) -> Result<Vec<SearchCandidate>>;
}
