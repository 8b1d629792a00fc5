//! Errors surfaced by the Ollama client.

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

/// Errors that can occur when talking to the inference server.
///
/// Variants fall into two user-facing groups: connectivity problems
/// (`Build`, `Request`, `Status`) and malformed bodies (`Json`, `Framing`).
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed response line: {0}")]
    Framing(#[from] LinesCodecError),
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// True for failures that mean the server could not be reached or refused
    /// the request, as opposed to a body that could not be decoded.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            ClientError::Build(_) | ClientError::Request(_) | ClientError::Status { .. }
        )
    }

    /// True when the request ran past the configured timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Request(e) if e.is_timeout())
    }

    /// One-line message suitable for showing to the person at the keyboard.
    pub fn user_message(&self) -> String {
        if self.is_connectivity() {
            format!("Could not reach Ollama server: {self}")
        } else {
            format!("Invalid JSON from server: {self}")
        }
    }
}
