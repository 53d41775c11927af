//! Common test utilities for fastener-search integration tests.
//!
//! The pipeline tests run against an in-memory vector index and a wiremock
//! embeddings endpoint, so they need neither Qdrant nor an API key.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fastener_core::{CandidateMetadata, HybridRanker, SearchCandidate, StandardTable};
use fastener_search::{
    OpenAIConfig, OpenAIProvider, ProductSearcher, Result, SearcherOptions, VectorIndex,
    VectorQuery,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Dimension of embeddings served by the mock endpoint
pub const TEST_DIM: usize = 8;

/// Vector index over a fixed candidate list.
///
/// Candidate scores stand in for similarity. Filters and thresholds are
/// applied the way Qdrant applies them, and every query is recorded.
#[derive(Default)]
pub struct InMemoryIndex {
    candidates: Vec<SearchCandidate>,
    queries: Mutex<Vec<VectorQuery>>,
}

impl InMemoryIndex {
    pub fn new(candidates: Vec<SearchCandidate>) -> Self {
        Self {
            candidates,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Queries received so far
    pub fn queries(&self) -> Vec<VectorQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn search(&self, query: VectorQuery) -> Result<Vec<SearchCandidate>> {
        self.queries.lock().unwrap().push(query.clone());

        let mut hits: Vec<SearchCandidate> = self
            .candidates
            .iter()
            .filter(|c| query.filter.as_ref().map_or(true, |f| f.accepts(c)))
            .filter(|c| query.score_threshold.map_or(true, |t| c.score >= t))
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(query.limit as usize);
        Ok(hits)
    }
}

/// Collection name unique to one test run
pub fn unique_collection(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{}_{}", prefix, nanos)
}

/// Candidate with only content
pub fn chunk(id: &str, score: f32, content: &str) -> SearchCandidate {
    SearchCandidate::new(id, score, content)
}

/// Candidate with a document and supplier
pub fn catalog_chunk(id: &str, score: f32, content: &str, supplier: &str) -> SearchCandidate {
    SearchCandidate::new(id, score, content).with_metadata(CandidateMetadata {
        document_id: Some(format!("{}-catalog", supplier.to_lowercase())),
        filename: Some(format!("{}.pdf", supplier.to_lowercase())),
        supplier: Some(supplier.to_string()),
        ..Default::default()
    })
}

/// Mock embeddings endpoint answering every request with unit vectors
pub async fn embedding_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(|request: &Request| {
            let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap_or_default();
            let count = body["input"].as_array().map(|a| a.len()).unwrap_or(0);
            let data: Vec<serde_json::Value> = (0..count)
                .map(|i| serde_json::json!({"embedding": vec![1.0_f32; TEST_DIM], "index": i}))
                .collect();
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": data }))
        })
        .mount(&server)
        .await;
    server
}

/// Provider pointed at a mock server, without retries
pub fn provider(server: &MockServer) -> Arc<OpenAIProvider> {
    let mut config = OpenAIConfig::openai("test-key").with_max_retries(0).with_timeout(5);
    config.base_url = server.uri();
    Arc::new(OpenAIProvider::new(config).unwrap())
}

/// Searcher over the built-in table with default options
pub fn searcher(index: Arc<InMemoryIndex>, server: &MockServer) -> ProductSearcher {
    searcher_with_options(index, server, SearcherOptions::default())
}

pub fn searcher_with_options(
    index: Arc<InMemoryIndex>,
    server: &MockServer,
    options: SearcherOptions,
) -> ProductSearcher {
    let ranker = HybridRanker::new(Arc::new(StandardTable::builtin()));
    ProductSearcher::new(index, provider(server), ranker).with_options(options)
}
