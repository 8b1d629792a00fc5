//! Ollama HTTP API client for text generation.
//!
//! Two explicit operations cover the two response shapes: [`Generate::stream_generate`]
//! forwards fragments as they arrive, [`Generate::generate_buffered`] waits for
//! the whole body. [`Generate::generate`] picks one from the request's `stream` flag.

use crate::cancel::CancelFlag;
use crate::config::ServerConfig;
use crate::error::{ClientError, Result};
use crate::request::GenerationRequest;
use crate::response::{self, GenerationResult, StreamOutcome};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Something that can run generations: the HTTP client, or a stand-in in tests.
#[async_trait]
pub trait Generate: Send + Sync {
    /// Streams a generation, calling `on_chunk` for every fragment in order.
    ///
    /// The returned outcome carries the terminal record when one was received.
    async fn stream_generate<'a>(
        &'a self,
        request: GenerationRequest,
        on_chunk: Box<dyn for<'s> FnMut(&'s str) + Send + 'a>,
        cancel: &'a CancelFlag,
    ) -> Result<StreamOutcome>;

    /// Runs a generation without streaming and returns the full text with its record.
    async fn generate_buffered(&self, request: GenerationRequest) -> Result<(String, GenerationResult)>;

    /// Lists the models installed on the server.
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;

    /// Dispatches on `request.stream`.
    ///
    /// In buffered mode `on_chunk` is called once with the whole text.
    async fn generate<'a>(
        &'a self,
        request: GenerationRequest,
        mut on_chunk: Box<dyn for<'s> FnMut(&'s str) + Send + 'a>,
        cancel: &'a CancelFlag,
    ) -> Result<StreamOutcome> {
        if request.stream {
            self.stream_generate(request, on_chunk, cancel).await
        } else {
            let (text, result) = self.generate_buffered(request).await?;
            on_chunk(&text);
            Ok(StreamOutcome::completed(result))
        }
    }
}

/// HTTP client for communicating with an Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    /// The base URL of the Ollama server (e.g., "http://localhost:11434")
    base_url: String,
    http_client: reqwest::Client,
    tags_timeout: Duration,
}

impl OllamaClient {
    /// Creates a client whose requests are bounded by `config.timeout_secs`.
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client,
            tags_timeout: config.tags_timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_generate(&self, request: &GenerationRequest) -> Result<reqwest::Response> {
        let url = format!("{}/api/generate", self.base_url);
        debug!(
            model = %request.model,
            stream = request.stream,
            num_gpu = ?request.gpu_layers(),
            "POST {}",
            url
        );

        let response = self.http_client.post(&url).json(request).send().await?;
        ensure_success(response).await
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status { status, body })
}

#[async_trait]
impl Generate for OllamaClient {
    async fn stream_generate<'a>(
        &'a self,
        request: GenerationRequest,
        on_chunk: Box<dyn for<'s> FnMut(&'s str) + Send + 'a>,
        cancel: &'a CancelFlag,
    ) -> Result<StreamOutcome> {
        let request = request.with_stream(true);
        let response = self.post_generate(&request).await?;

        let outcome = response::read_stream(response.bytes_stream(), on_chunk, cancel).await?;
        info!(
            model = %request.model,
            completed = outcome.result.is_some(),
            cancelled = outcome.cancelled,
            "Streaming generation finished"
        );
        Ok(outcome)
    }

    async fn generate_buffered(&self, request: GenerationRequest) -> Result<(String, GenerationResult)> {
        let request = request.with_stream(false);
        let response = self.post_generate(&request).await?;

        let body = response.text().await?;
        let parsed = response::parse_buffered(&body)?;
        info!(model = %request.model, chars = parsed.0.len(), "Buffered generation finished");
        Ok(parsed)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .timeout(self.tags_timeout)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let body = response.text().await?;
        let tags: TagsResponse = serde_json::from_str(&body)?;
        debug!(count = tags.models.len(), "Fetched model list");
        Ok(tags.models)
    }
}

/// A model entry from `GET /api/tags`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,

    #[serde(default)]
    pub size: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}
