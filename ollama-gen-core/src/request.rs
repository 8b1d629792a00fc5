//! Payload for `POST /api/generate`.

use crate::config::GenerationConfig;
use serde::Serialize;

/// Request payload for the Ollama generate API.
///
/// `options` is left out of the JSON entirely unless a GPU layer count was set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerationOptions>,
}

/// Server-side options forwarded verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationOptions {
    pub num_gpu: i32,
}

impl GenerationRequest {
    /// Creates a streaming request with no options.
    ///
    /// The model name is not checked here; an unknown model is reported by the server.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stream: true,
            options: None,
        }
    }

    /// Builds a request from configured defaults.
    pub fn from_config(prompt: impl Into<String>, config: &GenerationConfig) -> Self {
        Self::new(config.model.clone(), prompt)
            .with_stream(config.stream)
            .with_gpu_layers(config.num_gpu)
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Sets `options.num_gpu`, or drops `options` when `None`.
    pub fn with_gpu_layers(mut self, gpu_layers: Option<i32>) -> Self {
        self.options = gpu_layers.map(|num_gpu| GenerationOptions { num_gpu });
        self
    }

    pub fn gpu_layers(&self) -> Option<i32> {
        self.options.as_ref().map(|o| o.num_gpu)
    }
}
