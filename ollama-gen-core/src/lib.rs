//! ollama-gen-core - shared logic for the ollama-gen clients
//!
//! Provides everything between a presenter and the inference server:
//! - Request building for `POST /api/generate`
//! - NDJSON / single-object response reading with cooperative cancellation
//! - Derived timing and throughput statistics
//! - Configuration management
//! - A threaded generation session for interactive front-ends

pub mod cancel;
pub mod client;
pub mod config;
pub mod error;
pub mod request;
pub mod response;
pub mod session;
pub mod stats;

pub use cancel::CancelFlag;
pub use client::{Generate, ModelInfo, OllamaClient};
pub use config::{Config, ConfigError, GenerationConfig, ServerConfig};
pub use error::{ClientError, Result};
pub use request::{GenerationOptions, GenerationRequest};
pub use response::{GenerationResult, StreamOutcome};
pub use session::{Processor, Session, SessionError, SessionEvent, SessionSettings, Status, Tone};
pub use stats::DerivedStats;
