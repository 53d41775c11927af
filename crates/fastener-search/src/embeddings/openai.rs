//! OpenAI-compatible embedding provider
//!
//! Embeds catalog chunks and search queries through any endpoint that
//! speaks the OpenAI embeddings protocol (OpenAI, Azure OpenAI, Ollama).
//!
//! # Endpoint Format
//!
//! - POST `{base_url}/v1/embeddings`
//! - Request: `{"model": "...", "input": ["text1", "text2", ...]}`
//! - Response: `{"data": [{"embedding": [...], "index": 0}, ...], ...}`
//!
//! # Example
//!
//! ```ignore
//! use fastener_search::embeddings::{EmbeddingProvider, OpenAIConfig, OpenAIProvider};
//!
//! let provider = OpenAIProvider::new(OpenAIConfig::openai("sk-..."))?;
//! let embeddings = provider.encode(vec!["hex bolt M8 A2".into()]).await?;
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[cfg(feature = "rate-limit")]
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
#[cfg(feature = "rate-limit")]
use std::num::NonZeroU32;
#[cfg(feature = "rate-limit")]
use std::sync::Arc;

use fastener_config::EmbeddingSettings;

use super::provider::{EmbeddingProvider, ProviderStatus};
use crate::error::{Result, SearchError};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "text-embedding-3-small";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds)
const RETRY_BASE_DELAY_MS: u64 = 500;

#[cfg(feature = "rate-limit")]
const DEFAULT_REQUESTS_PER_SECOND: u32 = 10;

#[cfg(feature = "rate-limit")]
type OpenAIRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Configuration for the OpenAI-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Base URL for the API (e.g., "https://api.openai.com/v1")
    pub base_url: String,
    /// API key (optional for local endpoints)
    pub api_key: Option<String>,
    /// Embedding model name
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum retry attempts for transient failures
    pub max_retries: u32,
    /// Use Azure OpenAI header format (api-key instead of Bearer)
    pub azure_mode: bool,
    /// Requests per second limit
    #[cfg(feature = "rate-limit")]
    pub requests_per_second: u32,
}

impl OpenAIConfig {
    /// Config for the public OpenAI API
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: Some(api_key.into()),
            model: DEFAULT_MODEL.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            azure_mode: false,
            #[cfg(feature = "rate-limit")]
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
        }
    }

    /// Build from the `[embedding]` config section.
    ///
    /// The API key is read from the environment variable named by
    /// `api_key_env`; a missing or empty variable means no auth header.
    pub fn from_settings(settings: &EmbeddingSettings) -> Self {
        let api_key = settings
            .api_key_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|key| !key.is_empty());

        Self {
            base_url: settings.url.clone(),
            api_key,
            model: settings.model.clone(),
            timeout_secs: settings.timeout_secs,
            max_retries: settings.max_retries,
            azure_mode: settings.azure_mode,
            #[cfg(feature = "rate-limit")]
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
        }
    }

    /// Create config from environment variables
    ///
    /// - `FASTENER_OPENAI_BASE_URL` - API base URL (default: https://api.openai.com/v1)
    /// - `FASTENER_OPENAI_API_KEY` - API key (optional)
    /// - `FASTENER_OPENAI_MODEL` - Model name (default: text-embedding-3-small)
    /// - `FASTENER_OPENAI_AZURE_MODE` - Use Azure header format (default: false)
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("FASTENER_OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let api_key = std::env::var("FASTENER_OPENAI_API_KEY").ok();
        let model = std::env::var("FASTENER_OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
        let azure_mode = std::env::var("FASTENER_OPENAI_AZURE_MODE")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(false);

        Self {
            base_url,
            api_key,
            model,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            azure_mode,
            #[cfg(feature = "rate-limit")]
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
        }
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set max retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[cfg(feature = "rate-limit")]
    pub fn with_requests_per_second(mut self, rps: u32) -> Self {
        self.requests_per_second = rps;
        self
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

/// OpenAI-compatible embedding provider
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
    /// Embedding dimension detected from the first response
    dimension: AtomicUsize,
    #[cfg(feature = "rate-limit")]
    rate_limiter: Arc<OpenAIRateLimiter>,
}

impl OpenAIProvider {
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SearchError::ProviderUnavailable(format!("HTTP client error: {}", e)))?;

        #[cfg(feature = "rate-limit")]
        let rate_limiter = {
            let rps = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
            Arc::new(RateLimiter::direct(Quota::per_second(rps)))
        };

        Ok(Self {
            client,
            config,
            dimension: AtomicUsize::new(0),
            #[cfg(feature = "rate-limit")]
            rate_limiter,
        })
    }

    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        Self::new(OpenAIConfig::from_settings(settings))
    }

    pub fn from_env() -> Result<Self> {
        Self::new(OpenAIConfig::from_env())
    }

    #[cfg(feature = "rate-limit")]
    async fn wait_for_permit(&self) {
        self.rate_limiter.until_ready().await;
    }

    #[cfg(not(feature = "rate-limit"))]
    async fn wait_for_permit(&self) {}

    fn embeddings_url(&self) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        if base.ends_with("/v1") {
            format!("{}/embeddings", base)
        } else {
            format!("{}/v1/embeddings", base)
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.api_key {
            Some(ref api_key) if self.config.azure_mode => request.header("api-key", api_key),
            Some(ref api_key) => request.header("Authorization", format!("Bearer {}", api_key)),
            None => request,
        }
    }

    async fn request_with_retry(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut retry_delay = Duration::from_millis(RETRY_BASE_DELAY_MS);
        let mut attempt = 0;

        loop {
            self.wait_for_permit().await;

            match self.send_request(texts).await {
                Ok(embeddings) => return Ok(embeddings),
                // Auth and model errors will not fix themselves
                Err(e @ (SearchError::OpenAIAuth(_) | SearchError::OpenAIInvalidModel(_))) => {
                    return Err(e)
                }
                Err(e) if attempt >= self.config.max_retries => return Err(e),
                Err(e) => {
                    let delay = match e {
                        SearchError::OpenAIRateLimit {
                            retry_after: Some(secs),
                        } => Duration::from_secs(secs).max(retry_delay),
                        _ => retry_delay,
                    };
                    warn!(
                        attempt,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "Embedding request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    retry_delay *= 2;
                    attempt += 1;
                }
            }
        }
    }

    async fn send_request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = EmbeddingsRequest {
            model: &self.config.model,
            input: texts,
        };
        let request = self
            .client
            .post(self.embeddings_url())
            .header("Content-Type", "application/json")
            .json(&body);

        let response = self.authorized(request).send().await.map_err(|e| {
            if e.is_timeout() {
                SearchError::ProviderUnavailable("Request timed out".into())
            } else if e.is_connect() {
                SearchError::ProviderUnavailable(format!("Connection failed: {}", e))
            } else {
                SearchError::ProviderUnavailable(format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        match status {
            StatusCode::OK => {
                let parsed: EmbeddingsResponse = response.json().await.map_err(|e| {
                    SearchError::Embedding(format!("Invalid response: {}", e))
                })?;
                self.collect_embeddings(parsed, texts.len())
            }
            StatusCode::UNAUTHORIZED => {
                let body = response.text().await.unwrap_or_default();
                Err(SearchError::OpenAIAuth(format!("Authentication failed: {}", body)))
            }
            StatusCode::NOT_FOUND => {
                let body = response.text().await.unwrap_or_default();
                Err(SearchError::OpenAIInvalidModel(format!(
                    "Model '{}' not found: {}",
                    self.config.model, body
                )))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok());
                Err(SearchError::OpenAIRateLimit { retry_after })
            }
            StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => Err(
                SearchError::ProviderUnavailable("Service temporarily unavailable".into()),
            ),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(SearchError::ProviderUnavailable(format!(
                    "Request failed with status {}: {}",
                    status, body
                )))
            }
        }
    }

    /// Order embeddings by `index`, check the count and the dimension.
    fn collect_embeddings(
        &self,
        mut parsed: EmbeddingsResponse,
        expected: usize,
    ) -> Result<Vec<Vec<f32>>> {
        if parsed.data.len() != expected {
            return Err(SearchError::Embedding(format!(
                "Expected {} embeddings, got {}",
                expected,
                parsed.data.len()
            )));
        }
        parsed.data.sort_by_key(|d| d.index);
        let embeddings: Vec<Vec<f32>> = parsed.data.into_iter().map(|d| d.embedding).collect();

        if let Some(first) = embeddings.first() {
            let cached = self.dimension.load(Ordering::Relaxed);
            let expected_dim = if cached == 0 { first.len() } else { cached };
            super::validate_dimension(&embeddings, expected_dim)?;
            if cached == 0 {
                self.dimension.store(expected_dim, Ordering::Relaxed);
            }
        }

        Ok(embeddings)
    }

    async fn health_check(&self) -> Result<Duration> {
        let start = Instant::now();
        let input = ["health check".to_string()];
        let body = EmbeddingsRequest {
            model: &self.config.model,
            input: &input,
        };
        let request = self
            .client
            .post(self.embeddings_url())
            .header("Content-Type", "application/json")
            .json(&body);

        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| SearchError::ProviderUnavailable(format!("Health check failed: {}", e)))?;

        let status = response.status();
        let latency = start.elapsed();

        match status {
            StatusCode::OK => Ok(latency),
            StatusCode::UNAUTHORIZED => Err(SearchError::OpenAIAuth("Invalid API key".into())),
            StatusCode::NOT_FOUND => Err(SearchError::OpenAIInvalidModel(format!(
                "Model '{}' not found",
                self.config.model
            ))),
            // Rate limited still means reachable
            StatusCode::TOO_MANY_REQUESTS => Ok(latency),
            _ => Err(SearchError::ProviderUnavailable(format!(
                "Health check failed with status {}",
                status
            ))),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    async fn encode(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        debug!(count = texts.len(), model = %self.config.model, "Encoding texts");
        self.request_with_retry(&texts).await
    }

    async fn check_status(&self) -> Result<ProviderStatus> {
        let endpoint = self.embeddings_url();
        match self.health_check().await {
            Ok(latency) => Ok(ProviderStatus::healthy(endpoint, &self.config.model)
                .with_latency(latency.as_millis() as u64)),
            Err(e) => Ok(ProviderStatus::unavailable(endpoint, &self.config.model, e.to_string())),
        }
    }

    async fn warmup(&self) -> Result<()> {
        let status = self.check_status().await?;
        if !status.available {
            return Err(SearchError::ProviderUnavailable(
                status.error.unwrap_or_else(|| "Provider not ready".into()),
            ));
        }
        Ok(())
    }

    fn embedding_dim(&self) -> usize {
        let dim = self.dimension.load(Ordering::Relaxed);
        if dim > 0 {
            return dim;
        }
        match self.config.model.as_str() {
            "text-embedding-3-large" => 3072,
            "text-embedding-3-small" | "text-embedding-ada-002" => 1536,
            "nomic-embed-text" => 768,
            _ => 1536,
        }
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

impl std::fmt::Debug for OpenAIProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIProvider")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .field("timeout_secs", &self.config.timeout_secs)
            .field("azure_mode", &self.config.azure_mode)
            .finish()
    }
}
