//! Embedding generation for product search
//!
//! Queries and catalog chunks are embedded by the same remote model:
//!
//! ```text
//! EmbeddingProvider (trait)
//!     └── OpenAIProvider    - HTTP client for /v1/embeddings API
//! ```
//!
//! The trait is the seam the searcher and the indexer depend on; tests can
//! point an `OpenAIProvider` at a mock server or supply their own provider.

pub mod openai;
mod provider;

pub use openai::{OpenAIConfig, OpenAIProvider};
pub use provider::{validate_dimension, EmbeddingProvider, ProviderStatus};
