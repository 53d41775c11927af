//! End-to-end product search
//!
//! [`ProductSearcher`] wires the query classifier and hybrid ranker from
//! `fastener-core` to an embedding provider and a vector index:
//!
//! ```text
//! query ─► classify ─► filters + threshold ─► embed ─► vector search
//!                                                       │ (unfiltered retry when empty)
//!        response ◄─ truncate ◄─ exact filter ◄─ dedupe ◄─ rerank
//! ```
//!
//! # Example
//!
//! ```ignore
//! use fastener_search::{ProductSearcher, SearchRequest};
//!
//! let response = searcher.search("DIN 933 M8 A2", SearchRequest::default()).await?;
//! for item in &response.results {
//!     println!("{:>5.1} {}", item.score, item.snippet);
//! }
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use fastener_config::{FastenerConfig, ScoringSettings, SearchSettings, StandardsSettings};
use fastener_core::{
    classify_query, parse_groups, HybridRanker, ScoringConfig, SearchPolicy, StandardTable,
};

use crate::embeddings::EmbeddingProvider;
use crate::error::{Result, SearchError};
use crate::index::{VectorIndex, VectorQuery};
use crate::response::SearchResponse;

/// Retrieval knobs that live outside the ranker
#[derive(Debug, Clone, PartialEq)]
pub struct SearcherOptions {
    /// Results returned when the request gives no limit
    pub default_limit: usize,
    /// Candidates fetched per requested result
    pub pool_multiplier: usize,
    /// Smallest candidate pool
    pub min_pool: usize,
    /// Retry without filters when the filtered search finds nothing
    pub fallback_unfiltered: bool,
}

impl Default for SearcherOptions {
    fn default() -> Self {
        Self::from(&SearchSettings::default())
    }
}

impl From<&SearchSettings> for SearcherOptions {
    fn from(settings: &SearchSettings) -> Self {
        Self {
            default_limit: settings.default_limit,
            pool_multiplier: settings.pool_multiplier,
            min_pool: settings.min_pool,
            fallback_unfiltered: settings.fallback_unfiltered,
        }
    }
}

impl SearcherOptions {
    /// Number of candidates to request for `limit` results
    pub fn pool_size(&self, limit: usize) -> usize {
        limit.saturating_mul(self.pool_multiplier).max(self.min_pool)
    }
}

/// Per-call search parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub limit: Option<usize>,
    pub threshold: Option<f32>,
    /// Send payload filters derived from the query to the index
    pub apply_filters: bool,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            limit: None,
            threshold: None,
            apply_filters: true,
        }
    }
}

impl SearchRequest {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn without_filters(mut self) -> Self {
        self.apply_filters = false;
        self
    }
}

/// Product searcher over a vector index
pub struct ProductSearcher {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    ranker: HybridRanker,
    options: SearcherOptions,
}

impl ProductSearcher {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        ranker: HybridRanker,
    ) -> Self {
        Self {
            index,
            embedder,
            ranker,
            options: SearcherOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SearcherOptions) -> Self {
        self.options = options;
        self
    }

    /// Build a searcher from loaded configuration.
    ///
    /// Loads the extra equivalence table, if configured, over the built-in one.
    pub fn from_config(
        config: &FastenerConfig,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let table = load_standard_table(&config.standards)?;
        let ranker = HybridRanker::new(Arc::new(table))
            .with_scoring(scoring_config(&config.scoring))
            .with_policy(search_policy(&config.search));

        Ok(Self::new(index, embedder, ranker).with_options(SearcherOptions::from(&config.search)))
    }

    pub fn ranker(&self) -> &HybridRanker {
        &self.ranker
    }

    pub fn options(&self) -> &SearcherOptions {
        &self.options
    }

    /// Run the full pipeline for one query.
    ///
    /// Blank queries return an empty response without touching the
    /// embedder or the index. Embedder and index errors propagate as-is.
    pub async fn search(&self, query: &str, request: SearchRequest) -> Result<SearchResponse> {
        let started = Instant::now();
        let analysis = classify_query(query);

        if !self.ranker.should_use_vector_search(&analysis) {
            debug!("Blank query, skipping retrieval");
            return Ok(SearchResponse::empty(analysis));
        }

        let limit = request.limit.unwrap_or(self.options.default_limit).max(1);
        let threshold = self.ranker.similarity_threshold(&analysis, request.threshold);
        let pool = self.options.pool_size(limit);

        let vector = self
            .embedder
            .encode(vec![query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SearchError::Embedding("No embedding returned for query".into()))?;

        let mut vector_query =
            VectorQuery::new(vector, pool as u64).with_score_threshold(threshold);
        if request.apply_filters {
            vector_query = vector_query.with_filter(self.ranker.build_search_filters(&analysis));
        }

        debug!(
            query_type = %analysis.query_type,
            filtered = vector_query.filter.is_some(),
            pool,
            threshold,
            "Searching vector index"
        );

        let mut candidates = self.index.search(vector_query.clone()).await?;
        if candidates.is_empty()
            && vector_query.filter.is_some()
            && self.options.fallback_unfiltered
        {
            info!("Filtered search returned nothing, retrying without filters");
            candidates = self.index.search(vector_query.unfiltered()).await?;
        }
        let retrieved = candidates.len();

        let ranked = self.ranker.rerank_results(candidates, &analysis);
        let ranked = self.ranker.dedupe_results(ranked);
        let mut ranked = self.ranker.filter_by_exact_standard(ranked, &analysis);
        ranked.truncate(limit);

        let took_ms = started.elapsed().as_millis() as u64;
        info!(
            query = %analysis.query,
            retrieved,
            returned = ranked.len(),
            took_ms,
            "Search complete"
        );

        Ok(SearchResponse::build(&self.ranker, analysis, ranked, took_ms))
    }
}

/// Built-in equivalence table plus any configured extra groups
pub fn load_standard_table(settings: &StandardsSettings) -> Result<StandardTable> {
    let table = StandardTable::builtin();
    match settings.extra_table {
        Some(ref path) => extend_table(table, path),
        None => Ok(table),
    }
}

fn extend_table(table: StandardTable, path: &Path) -> Result<StandardTable> {
    debug!("Loading extra equivalence groups from {:?}", path);
    let content = std::fs::read_to_string(path)?;
    let groups = parse_groups(&content)?;
    info!("Loaded {} extra equivalence groups", groups.len());
    Ok(table.with_groups(groups)?)
}

pub fn scoring_config(settings: &ScoringSettings) -> ScoringConfig {
    ScoringConfig {
        exact_match_boost: settings.exact_match_boost,
        equivalent_match_boost: settings.equivalent_match_boost,
        thread_match_boost: settings.thread_match_boost,
        material_match_boost: settings.material_match_boost,
    }
}

pub fn search_policy(settings: &SearchSettings) -> SearchPolicy {
    SearchPolicy {
        default_threshold: settings.default_threshold,
        exact_match_threshold: settings.exact_match_threshold,
        min_exact_matches: settings.min_exact_matches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fastener_core::normalize_standard_code;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_pool_size() {
        let options = SearcherOptions::default();
        assert_eq!(options.pool_size(1), 20);
        assert_eq!(options.pool_size(10), 40);
        assert_eq!(options.pool_size(usize::MAX), usize::MAX);
    }

    #[test]
    fn test_request_builders() {
        let request = SearchRequest::default().with_limit(5).with_threshold(0.3).without_filters();
        assert_eq!(request.limit, Some(5));
        assert_eq!(request.threshold, Some(0.3));
        assert!(!request.apply_filters);
    }

    #[test]
    fn test_settings_conversions() {
        let config = FastenerConfig::default();
        assert_eq!(scoring_config(&config.scoring), ScoringConfig::default());
        assert_eq!(search_policy(&config.search), SearchPolicy::default());
        assert_eq!(SearcherOptions::from(&config.search), SearcherOptions::default());
    }

    #[test]
    fn test_load_extra_table() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[group]]
category = "screw"
name = "Supplier hex screw"
codes = ["DIN 933", "UNI 5739"]
"#
        )
        .unwrap();

        let settings = StandardsSettings {
            extra_table: Some(file.path().to_path_buf()),
        };
        let table = load_standard_table(&settings).unwrap();

        let din = normalize_standard_code("DIN 933").unwrap();
        let uni = normalize_standard_code("UNI 5739").unwrap();
        assert!(table.are_equivalent(&din, &uni));
    }

    #[test]
    fn test_missing_extra_table_is_io_error() {
        let settings = StandardsSettings {
            extra_table: Some("/nonexistent/fastener/groups.toml".into()),
        };
        assert!(matches!(load_standard_table(&settings), Err(SearchError::Io(_))));
    }
}
