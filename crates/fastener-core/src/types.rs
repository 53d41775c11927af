//! Candidate and result types shared by the ranker and the search service

use serde::{Deserialize, Serialize};

use crate::classifier::{
    extract_material_outside_codes, extract_product_type, extract_thread, Material, ProductType,
    ThreadSpec,
};
use crate::standards::{find_standard_codes, StandardCode};

/// Payload attached to an indexed product chunk.
///
/// Every field is optional; catalogs are inconsistent about what they tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CandidateMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    /// Thread tag such as "M8x30"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread: Option<String>,
    /// Standard tag such as "DIN 933" or "DIN 933 / ISO 4017"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard: Option<String>,
}

/// A chunk returned by vector search, before reranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCandidate {
    pub id: String,
    /// Vector similarity as reported by the index
    pub score: f32,
    pub content: String,
    #[serde(default)]
    pub metadata: CandidateMetadata,
}

impl SearchCandidate {
    pub fn new(id: impl Into<String>, score: f32, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            score,
            content: content.into(),
            metadata: CandidateMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: CandidateMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Standard codes this candidate carries.
    ///
    /// The metadata tag is authoritative; content is only scanned when the
    /// chunk has no standard tag at all.
    pub fn standard_codes(&self) -> Vec<StandardCode> {
        let source = self.metadata.standard.as_deref().unwrap_or(&self.content);
        let mut codes: Vec<StandardCode> = Vec::new();
        for occurrence in find_standard_codes(source) {
            if !codes.contains(&occurrence.code) {
                codes.push(occurrence.code);
            }
        }
        codes
    }

    /// Material from the metadata tag, falling back to content.
    ///
    /// Numbers inside standard codes and the thread are not materials:
    /// "Wing screw DIN 316 M8" carries no material.
    pub fn material(&self) -> Option<Material> {
        self.metadata
            .material
            .as_deref()
            .and_then(extract_material_outside_codes)
            .or_else(|| extract_material_outside_codes(&self.content))
    }

    /// Product type from the metadata tag, falling back to content
    pub fn product_type(&self) -> Option<ProductType> {
        self.metadata
            .product_type
            .as_deref()
            .and_then(extract_product_type)
            .or_else(|| extract_product_type(&self.content))
    }

    /// Thread from the metadata tag, falling back to content
    pub fn thread(&self) -> Option<ThreadSpec> {
        self.metadata
            .thread
            .as_deref()
            .and_then(extract_thread)
            .or_else(|| extract_thread(&self.content))
    }
}

/// How a candidate relates to the requested standard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StandardMatch {
    /// Candidate carries the requested code itself
    Direct,
    /// Candidate carries an equivalent code
    Equivalent,
    None,
}

impl StandardMatch {
    pub fn is_exact(&self) -> bool {
        !matches!(self, StandardMatch::None)
    }
}

/// A candidate after hybrid scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResult {
    pub id: String,
    pub content: String,
    pub metadata: CandidateMetadata,
    /// Vector similarity as reported by the index
    pub vector_score: f32,
    /// Final ranking score
    pub hybrid_score: f32,
    /// Carries the requested standard or one of its equivalents
    pub exact_standard_match: bool,
    pub standard_match: StandardMatch,
}
