//! Fastener Core - Query classification and hybrid reranking for fastener search
//!
//! This crate holds the synchronous, deterministic part of product search over
//! fastener catalogs. It has no I/O; the search service wires it between an
//! embeddings client and a vector index.
//!
//! # Features
//!
//! - **Standard codes**: normalize `din933`, `DIN EN ISO 4017` or `GB/T 5783`
//!   to one canonical [`StandardCode`]
//! - **Equivalence table**: DIN ↔ ISO ↔ EN ↔ GB ↔ UNI cross references,
//!   extendable from TOML
//! - **Query classification**: standard, metric thread, material and product
//!   type extraction into a [`QueryAnalysis`]
//! - **Hybrid reranking**: boosts exact and equivalent standard matches over
//!   raw vector similarity
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use fastener_core::{classify_query, HybridRanker, QueryType, StandardTable};
//!
//! let analysis = classify_query("DIN 933 M8x30 A2");
//! assert_eq!(analysis.query_type, QueryType::ExactStandard);
//!
//! let ranker = HybridRanker::new(Arc::new(StandardTable::builtin()));
//! let filters = ranker.build_search_filters(&analysis);
//! assert!(filters.standard_equivalents.contains(&"ISO 4017".to_string()));
//! ```

pub mod classifier;
pub mod error;
pub mod hybrid;
pub mod standards;
pub mod types;

// Re-exports for convenience
pub use classifier::{
    classify_query, extract_material, extract_material_outside_codes, extract_product_type,
    extract_standard, extract_thread, ExtractedStandard, Material, ProductType, QueryAnalysis,
    QueryType, ThreadSpec,
};
pub use error::{Result, TableError};
pub use hybrid::{FilterSpec, HybridRanker, ScoringConfig, SearchPolicy, StandardSuggestion};
pub use standards::{
    find_standard_codes, format_standard_for_display, normalize_standard_code, parse_groups,
    CodeOccurrence, EquivalenceGroup, Organization, StandardCode, StandardRecord, StandardTable,
};
pub use types::{CandidateMetadata, RankedResult, SearchCandidate, StandardMatch};
