//! Collection schema and point types for Qdrant
//!
//! Each point is one chunk of a supplier catalog. Besides the raw metadata
//! tags, the indexer stores normalized keyword fields (`standard_codes`,
//! `material_code`, `thread_size`, `product_kind`) that the search filter
//! matches against.

use qdrant_client::qdrant::Distance;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use fastener_core::{format_standard_for_display, CandidateMetadata, SearchCandidate};

/// Collection names used by fastener-search
pub mod collections {
    /// Default product chunk collection
    pub const PRODUCTS: &str = "product_chunks";
}

/// Vector collection parameters
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    pub name: String,
    pub dimension: u64,
    pub distance: Distance,
}

impl CollectionConfig {
    /// Cosine collection of the given name and dimension
    pub fn products(name: impl Into<String>, dimension: u64) -> Self {
        Self {
            name: name.into(),
            dimension,
            distance: Distance::Cosine,
        }
    }
}

/// Payload field names
pub mod fields {
    /// Original chunk identifier
    pub const CHUNK_ID: &str = "chunk_id";
    /// Chunk text
    pub const CONTENT: &str = "content";
    pub const DOCUMENT_ID: &str = "document_id";
    pub const FILENAME: &str = "filename";
    pub const SUPPLIER: &str = "supplier";
    pub const PAGE: &str = "page";
    /// Raw tags as delivered by ingestion
    pub const PRODUCT_TYPE: &str = "product_type";
    pub const MATERIAL: &str = "material";
    pub const THREAD: &str = "thread";
    pub const STANDARD: &str = "standard";
    /// Normalized keyword fields used for filtering
    pub const STANDARD_CODES: &str = "standard_codes";
    pub const MATERIAL_CODE: &str = "material_code";
    pub const THREAD_SIZE: &str = "thread_size";
    pub const PRODUCT_KIND: &str = "product_kind";

    /// Fields that get a keyword payload index
    pub const KEYWORD_INDEXED: [&str; 6] = [
        STANDARD_CODES,
        MATERIAL_CODE,
        THREAD_SIZE,
        PRODUCT_KIND,
        DOCUMENT_ID,
        SUPPLIER,
    ];
}

/// One line of a chunk file produced by the ingestion pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: CandidateMetadata,
}

/// A point to upsert into the product collection
#[derive(Debug, Clone)]
pub struct ChunkPoint {
    /// Point ID derived from the chunk id
    pub id: u64,
    /// Vector embedding
    pub vector: Vec<f32>,
    pub record: ChunkRecord,
}

impl ChunkPoint {
    pub fn new(record: ChunkRecord, vector: Vec<f32>) -> Self {
        Self {
            id: Self::generate_id(&record.id),
            vector,
            record,
        }
    }

    /// Stable point ID: first eight bytes of the SHA-256 of the chunk id
    pub fn generate_id(chunk_id: &str) -> u64 {
        let digest = Sha256::digest(chunk_id.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(bytes)
    }

    /// JSON payload with raw tags and normalized keyword fields.
    ///
    /// Absent tags are left out rather than stored as null.
    pub fn payload(&self) -> Value {
        let record = &self.record;
        let meta = &record.metadata;
        let candidate = SearchCandidate::new(record.id.clone(), 0.0, record.content.clone())
            .with_metadata(meta.clone());

        let standard_codes: Vec<String> = candidate
            .standard_codes()
            .iter()
            .map(format_standard_for_display)
            .collect();

        let mut payload = json!({
            fields::CHUNK_ID: record.id,
            fields::CONTENT: record.content,
            fields::DOCUMENT_ID: meta.document_id,
            fields::FILENAME: meta.filename,
            fields::SUPPLIER: meta.supplier,
            fields::PAGE: meta.page,
            fields::PRODUCT_TYPE: meta.product_type,
            fields::MATERIAL: meta.material,
            fields::THREAD: meta.thread,
            fields::STANDARD: meta.standard,
            fields::STANDARD_CODES: standard_codes,
            fields::MATERIAL_CODE: candidate.material().map(|m| m.as_str()),
            fields::THREAD_SIZE: candidate.thread().map(|t| format!("M{}", t.diameter)),
            fields::PRODUCT_KIND: candidate.product_type().map(|p| p.as_str()),
        });
        if let Value::Object(map) = &mut payload {
            map.retain(|_, value| !value.is_null());
        }
        payload
    }
}
