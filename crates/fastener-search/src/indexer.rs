//! Chunk indexer for Qdrant
//!
//! Loads newline-delimited JSON chunk records produced by the catalog
//! ingestion pipeline, embeds them in batches and upserts them into the
//! product collection.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use fastener_search::{ChunkIndexer, OpenAIProvider, QdrantConfig, QdrantStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = QdrantStore::connect(QdrantConfig::default(), "product_chunks").await?;
//!     let provider = Arc::new(OpenAIProvider::from_env()?);
//!     let indexer = ChunkIndexer::new(store, provider, 1536);
//!
//!     let stats = indexer.index_file("chunks.jsonl".as_ref(), false).await?;
//!     println!("Indexed {} chunks", stats.total_indexed);
//!     Ok(())
//! }
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::client::QdrantStore;
use crate::embeddings::{validate_dimension, EmbeddingProvider};
use crate::error::{Result, SearchError};
use crate::schema::{ChunkPoint, ChunkRecord};

/// Statistics from an indexing run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Records read from the input
    pub total_processed: usize,
    /// Records embedded and upserted
    pub total_indexed: usize,
    /// Records skipped because their content was blank
    pub total_skipped: usize,
    /// Records in batches the embedder failed on
    pub total_failed: usize,
}

/// Parse newline-delimited chunk records.
///
/// Blank lines are skipped. A malformed line fails the whole read with its
/// 1-based line number.
pub fn read_chunks(reader: impl BufRead) -> Result<Vec<ChunkRecord>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: ChunkRecord =
            serde_json::from_str(&line).map_err(|e| SearchError::InvalidChunk {
                line: idx + 1,
                message: e.to_string(),
            })?;
        records.push(record);
    }
    Ok(records)
}

/// Embed records in batches of `batch_size`.
///
/// A batch the provider fails on is counted in `total_failed` and left out;
/// a batch with the wrong vector dimension aborts the run.
pub async fn embed_chunks(
    provider: &dyn EmbeddingProvider,
    records: Vec<ChunkRecord>,
    batch_size: usize,
    dimension: usize,
) -> Result<(Vec<ChunkPoint>, IndexStats)> {
    let mut stats = IndexStats {
        total_processed: records.len(),
        ..Default::default()
    };

    let (records, blank): (Vec<_>, Vec<_>) = records
        .into_iter()
        .partition(|r| !r.content.trim().is_empty());
    stats.total_skipped = blank.len();

    let batch_size = batch_size.max(1);
    let total = records.len();
    let mut points = Vec::with_capacity(total);

    for (batch_idx, batch) in records.chunks(batch_size).enumerate() {
        let texts: Vec<String> = batch.iter().map(|r| r.content.clone()).collect();
        let vectors = match provider.encode(texts).await {
            Ok(vectors) => vectors,
            Err(e) => {
                warn!("Embedding batch {} failed: {}", batch_idx, e);
                stats.total_failed += batch.len();
                continue;
            }
        };
        validate_dimension(&vectors, dimension)?;

        points.extend(
            batch
                .iter()
                .cloned()
                .zip(vectors)
                .map(|(record, vector)| ChunkPoint::new(record, vector)),
        );
        stats.total_indexed += batch.len();

        let processed = (batch_idx + 1) * batch_size;
        debug!("Embedding progress: {}/{}", processed.min(total), total);
    }

    Ok((points, stats))
}

/// Indexer that fills a Qdrant collection from chunk files
pub struct ChunkIndexer {
    store: QdrantStore,
    provider: Arc<dyn EmbeddingProvider>,
    dimension: u64,
    /// Texts per embedding request
    embedding_batch_size: usize,
    /// Points per upsert request
    batch_size: usize,
}

impl ChunkIndexer {
    pub fn new(store: QdrantStore, provider: Arc<dyn EmbeddingProvider>, dimension: u64) -> Self {
        Self {
            store,
            provider,
            dimension,
            embedding_batch_size: 64,
            batch_size: 100,
        }
    }

    /// Set batch size for embedding API calls
    pub fn with_embedding_batch_size(mut self, size: usize) -> Self {
        self.embedding_batch_size = size;
        self
    }

    /// Set batch size for upserts
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn store(&self) -> &QdrantStore {
        &self.store
    }

    /// Index every record of a JSONL file.
    ///
    /// With `recreate`, the collection is dropped first.
    pub async fn index_file(&self, path: &Path, recreate: bool) -> Result<IndexStats> {
        info!("Reading chunks from {}", path.display());
        let records = read_chunks(BufReader::new(File::open(path)?))?;
        self.index_records(records, recreate).await
    }

    pub async fn index_records(
        &self,
        records: Vec<ChunkRecord>,
        recreate: bool,
    ) -> Result<IndexStats> {
        if recreate {
            self.store.delete_collection().await?;
        }
        self.store.ensure_collection(self.dimension).await?;

        let (points, stats) = embed_chunks(
            self.provider.as_ref(),
            records,
            self.embedding_batch_size,
            self.dimension as usize,
        )
        .await?;

        self.store.upsert_points_batched(points, self.batch_size).await?;

        info!(
            "Indexing complete: {} processed, {} indexed, {} skipped, {} failed",
            stats.total_processed, stats.total_indexed, stats.total_skipped, stats.total_failed
        );
        Ok(stats)
    }
}
