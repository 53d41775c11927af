//! Fastener Search - standards-aware product search over Qdrant
//!
//! This crate connects the pure ranking logic of `fastener-core` to its
//! collaborators: an OpenAI-compatible embedding endpoint and a Qdrant
//! collection of supplier catalog chunks.
//!
//! # Features
//!
//! - **Equivalence-aware filtering**: a query for DIN 934 also retrieves
//!   chunks tagged ISO 4032, EN 24032 or GB 6170
//! - **Hybrid ranking**: exact standard matches always outrank vector neighbours
//! - **Chunk indexing**: JSONL chunk files are embedded and upserted in batches
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use fastener_config::FastenerConfig;
//! use fastener_search::{
//!     OpenAIProvider, ProductSearcher, QdrantConfig, QdrantStore, SearchRequest,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = FastenerConfig::default();
//!     let qdrant = QdrantConfig::from_settings(&config.qdrant);
//!     let store = QdrantStore::connect(qdrant, "product_chunks").await?;
//!     let embedder = Arc::new(OpenAIProvider::from_settings(&config.embedding)?);
//!
//!     let searcher = ProductSearcher::from_config(&config, Arc::new(store), embedder)?;
//!     let response = searcher.search("DIN 934 M10 A2", SearchRequest::default()).await?;
//!     println!("{} results", response.total);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod embeddings;
pub mod error;
pub mod index;
pub mod indexer;
pub mod response;
pub mod schema;
pub mod searcher;

pub use client::{build_filter, QdrantConfig, QdrantStore};
pub use embeddings::{
    validate_dimension, EmbeddingProvider, OpenAIConfig, OpenAIProvider, ProviderStatus,
};
pub use error::{Result, SearchError};
pub use index::{VectorIndex, VectorQuery};
pub use indexer::{embed_chunks, read_chunks, ChunkIndexer, IndexStats};
pub use response::{DocumentRef, SearchResponse, SearchResultItem};
pub use schema::{collections, ChunkPoint, ChunkRecord, CollectionConfig};
pub use searcher::{load_standard_table, ProductSearcher, SearchRequest, SearcherOptions};
