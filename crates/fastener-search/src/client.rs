//! Qdrant client wrapper for fastener-search
//!
//! Provides connection handling, collection management, batched upserts and
//! filtered similarity search over product chunks.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    vectors_config::Config, Condition, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder,
    FieldType, Filter, PointStruct, SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue,
    VectorParams, VectorsConfig,
};
use qdrant_client::{Payload, Qdrant};
use tracing::{debug, info};

use fastener_config::QdrantSettings;
use fastener_core::{CandidateMetadata, FilterSpec, SearchCandidate};

use crate::error::{Result, SearchError};
use crate::index::{VectorIndex, VectorQuery};
use crate::schema::{fields, ChunkPoint, CollectionConfig};

/// Configuration for connecting to Qdrant
#[derive(Debug, Clone)]
pub struct QdrantConfig {
    /// Qdrant server URL (e.g., "http://localhost:6334")
    pub url: String,
    /// Optional API key for authentication
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl QdrantConfig {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Build from the `[qdrant]` config section
    pub fn from_settings(settings: &QdrantSettings) -> Self {
        Self {
            url: settings.url.clone(),
            api_key: settings.api_key(),
            timeout_secs: settings.timeout_secs,
        }
    }
}

/// Qdrant-backed store for one product chunk collection
pub struct QdrantStore {
    client: Qdrant,
    collection: String,
}

impl QdrantStore {
    /// Connect to Qdrant and verify the server answers
    pub async fn connect(config: QdrantConfig, collection: impl Into<String>) -> Result<Self> {
        info!("Connecting to Qdrant at {}", config.url);

        let mut builder =
            Qdrant::from_url(&config.url).timeout(Duration::from_secs(config.timeout_secs));
        if let Some(api_key) = config.api_key {
            builder = builder.api_key(api_key);
        }

        let client = builder
            .build()
            .map_err(|e| SearchError::Connection(format!("Failed to build Qdrant client: {}", e)))?;

        client
            .list_collections()
            .await
            .map_err(|e| SearchError::Connection(format!("Failed to connect to Qdrant: {}", e)))?;

        info!("Successfully connected to Qdrant");

        Ok(Self {
            client,
            collection: collection.into(),
        })
    }

    /// Name of the collection this store reads and writes
    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub async fn collection_exists(&self) -> Result<bool> {
        Ok(self.client.collection_exists(self.collection.as_str()).await?)
    }

    /// Create the collection and its keyword indexes if missing
    pub async fn ensure_collection(&self, dimension: u64) -> Result<()> {
        if self.collection_exists().await? {
            debug!("Collection '{}' already exists", self.collection);
            return Ok(());
        }

        let config = CollectionConfig::products(self.collection.clone(), dimension);
        info!(
            "Creating collection '{}' (dim={}, distance={:?})",
            config.name, config.dimension, config.distance
        );

        let vectors_config = VectorsConfig {
            config: Some(Config::Params(VectorParams {
                size: config.dimension,
                distance: config.distance.into(),
                ..Default::default()
            })),
        };

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&config.name).vectors_config(vectors_config),
            )
            .await?;

        self.create_payload_indexes().await?;

        info!("Collection '{}' created successfully", config.name);
        Ok(())
    }

    async fn create_payload_indexes(&self) -> Result<()> {
        for field in fields::KEYWORD_INDEXED {
            self.client
                .create_field_index(CreateFieldIndexCollectionBuilder::new(
                    &self.collection,
                    field,
                    FieldType::Keyword,
                ))
                .await?;
        }

        debug!("Payload indexes created for '{}'", self.collection);
        Ok(())
    }

    pub async fn delete_collection(&self) -> Result<()> {
        if !self.collection_exists().await? {
            return Ok(());
        }

        info!("Deleting collection '{}'", self.collection);
        self.client.delete_collection(self.collection.as_str()).await?;
        Ok(())
    }

    /// Upsert points and wait for them to be applied
    pub async fn upsert_points(&self, points: Vec<ChunkPoint>) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        debug!("Upserting {} points to '{}'", points.len(), self.collection);

        let qdrant_points = points
            .into_iter()
            .map(|p| {
                let payload = Payload::try_from(p.payload())?;
                Ok(PointStruct::new(p.id, p.vector, payload))
            })
            .collect::<Result<Vec<_>>>()?;

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, qdrant_points).wait(true))
            .await?;

        Ok(())
    }

    /// Upsert points in batches to avoid timeouts
    pub async fn upsert_points_batched(
        &self,
        points: Vec<ChunkPoint>,
        batch_size: usize,
    ) -> Result<()> {
        let total = points.len();
        if total == 0 {
            return Ok(());
        }
        let batch_size = batch_size.max(1);

        info!(
            "Upserting {} points to '{}' in batches of {}",
            total, self.collection, batch_size
        );

        let batch_total = total.div_ceil(batch_size);
        for (i, batch) in points.chunks(batch_size).enumerate() {
            debug!("Processing batch {}/{} ({} points)", i + 1, batch_total, batch.len());
            self.upsert_points(batch.to_vec()).await?;
        }

        info!("Successfully upserted {} points", total);
        Ok(())
    }

    /// Number of points in the collection, `None` if it does not exist
    pub async fn point_count(&self) -> Result<Option<u64>> {
        if !self.collection_exists().await? {
            return Ok(None);
        }

        let info = self.client.collection_info(self.collection.as_str()).await?;
        let count = info
            .result
            .ok_or_else(|| SearchError::CollectionNotFound(self.collection.clone()))?
            .points_count
            .unwrap_or(0);
        Ok(Some(count))
    }
}

#[async_trait]
impl VectorIndex for QdrantStore {
    async fn search(&self, query: VectorQuery) -> Result<Vec<SearchCandidate>> {
        let mut request = SearchPointsBuilder::new(&self.collection, query.vector, query.limit)
            .with_payload(true);
        if let Some(filter) = query.filter.as_ref().and_then(build_filter) {
            request = request.filter(filter);
        }
        if let Some(threshold) = query.score_threshold {
            request = request.score_threshold(threshold);
        }

        let response = self.client.search_points(request).await?;
        debug!(
            hits = response.result.len(),
            collection = %self.collection,
            "Qdrant search finished"
        );

        Ok(response
            .result
            .into_iter()
            .map(|point| candidate_from_payload(point.score, &point.payload))
            .collect())
    }
}

/// Translate a filter into Qdrant `must` conditions on the keyword fields.
///
/// Multi-valued constraints (standard plus equivalents, compatible
/// materials) become match-any conditions.
pub fn build_filter(constraints: &FilterSpec) -> Option<Filter> {
    let mut conditions = Vec::new();

    if constraints.standard.is_some() {
        conditions.push(Condition::matches(
            fields::STANDARD_CODES,
            constraints.accepted_standards(),
        ));
    }
    if let Some(material) = constraints.material {
        let codes: Vec<String> = material
            .compatible_codes()
            .iter()
            .map(|code| code.to_string())
            .collect();
        conditions.push(Condition::matches(fields::MATERIAL_CODE, codes));
    }
    if let Some(size) = constraints.thread_size() {
        conditions.push(Condition::matches(fields::THREAD_SIZE, size));
    }
    if let Some(product_type) = constraints.product_type {
        conditions.push(Condition::matches(
            fields::PRODUCT_KIND,
            product_type.as_str().to_string(),
        ));
    }

    if conditions.is_empty() {
        None
    } else {
        Some(Filter::must(conditions))
    }
}

/// Rebuild a candidate from a stored payload
fn candidate_from_payload(score: f32, payload: &HashMap<String, QdrantValue>) -> SearchCandidate {
    let get_string =
        |key: &str| -> Option<String> { payload.get(key).and_then(|v| v.as_str()).cloned() };

    let metadata = CandidateMetadata {
        document_id: get_string(fields::DOCUMENT_ID),
        filename: get_string(fields::FILENAME),
        supplier: get_string(fields::SUPPLIER),
        page: payload
            .get(fields::PAGE)
            .and_then(|v| v.as_integer())
            .and_then(|page| u32::try_from(page).ok()),
        product_type: get_string(fields::PRODUCT_TYPE),
        material: get_string(fields::MATERIAL),
        thread: get_string(fields::THREAD),
        standard: get_string(fields::STANDARD),
    };

    SearchCandidate::new(
        get_string(fields::CHUNK_ID).unwrap_or_default(),
        score,
        get_string(fields::CONTENT).unwrap_or_default(),
    )
    .with_metadata(metadata)
}
