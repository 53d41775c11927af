//! Embedding provider trait and types

use async_trait::async_trait;

use crate::error::Result;

/// Status of an embedding provider
///
/// Contains health and capability information for diagnostics.
#[derive(Debug, Clone)]
pub struct ProviderStatus {
    /// Whether the provider is available and responding
    pub available: bool,
    /// Endpoint being used
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// Last health check latency in milliseconds
    pub latency_ms: Option<u64>,
    /// Error message if provider is unavailable
    pub error: Option<String>,
}

impl ProviderStatus {
    /// Create a status for a healthy provider
    pub fn healthy(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            available: true,
            endpoint: endpoint.into(),
            model: model.into(),
            latency_ms: None,
            error: None,
        }
    }

    /// Create a status for an unavailable provider
    pub fn unavailable(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            available: false,
            endpoint: endpoint.into(),
            model: model.into(),
            latency_ms: None,
            error: Some(error.into()),
        }
    }

    /// Set latency from a health check
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = Some(latency_ms);
        self
    }
}

/// Embedding provider trait
///
/// Turns query text and catalog chunks into vectors. The same model must
/// embed both sides, so there is a single `encode` entry point.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; one provider is shared across
/// concurrent searches behind an `Arc`.
///
/// # Example
///
/// ```ignore
/// use fastener_search::embeddings::EmbeddingProvider;
///
/// async fn example(provider: &dyn EmbeddingProvider) -> fastener_search::Result<()> {
///     let status = provider.check_status().await?;
///     if !status.available {
///         return Err(fastener_search::SearchError::ProviderUnavailable(
///             status.error.unwrap_or_default()
///         ));
///     }
///
///     let embeddings = provider.encode(vec!["hex bolt M8".to_string()]).await?;
///     assert_eq!(embeddings[0].len(), provider.embedding_dim());
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts
    ///
    /// # Returns
    /// One vector per input, in input order, each with `embedding_dim()` dimensions
    async fn encode(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    /// Check provider connectivity and status
    async fn check_status(&self) -> Result<ProviderStatus>;

    /// Establish connections and measure latency
    async fn warmup(&self) -> Result<()>;

    /// Dimensionality of generated embeddings (e.g., 1536 for text-embedding-3-small)
    fn embedding_dim(&self) -> usize;

    /// Model identifier
    fn model(&self) -> &str;
}

/// Check that every embedding has the expected dimension
pub fn validate_dimension(embeddings: &[Vec<f32>], expected: usize) -> Result<()> {
    if let Some(bad) = embeddings.iter().find(|e| e.len() != expected) {
        return Err(crate::error::SearchError::DimensionMismatch {
            expected,
            actual: bad.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchError;

    #[test]
    fn test_provider_status_healthy() {
        let status = ProviderStatus::healthy("https://api.openai.com/v1", "text-embedding-3-small");
        assert!(status.available);
        assert_eq!(status.model, "text-embedding-3-small");
        assert!(status.error.is_none());
    }

    #[test]
    fn test_provider_status_unavailable() {
        let status =
            ProviderStatus::unavailable("http://localhost:11434/v1", "nomic", "Connection timeout");
        assert!(!status.available);
        assert_eq!(status.error, Some("Connection timeout".to_string()));
    }

    #[test]
    fn test_provider_status_with_latency() {
        let status = ProviderStatus::healthy("http://embed", "m").with_latency(150);
        assert_eq!(status.latency_ms, Some(150));
    }

    #[test]
    fn test_validate_dimension() {
        assert!(validate_dimension(&[vec![0.0; 4], vec![0.0; 4]], 4).is_ok());
        let err = validate_dimension(&[vec![0.0; 4], vec![0.0; 3]], 4).unwrap_err();
        assert!(matches!(err, SearchError::DimensionMismatch { expected: 4, actual: 3 }));
    }
}
