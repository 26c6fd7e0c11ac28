// Multi-provider LLM support
//
// This module provides an abstraction layer over different LLM backends
// (Anthropic, OpenAI) so the HTTP layer works with one request/response model
// regardless of which backend serves a model.

use async_trait::async_trait;
use tokio::sync::mpsc::Receiver;

use crate::errors::Result;

pub mod types;

pub mod sse;
pub mod translate;

// Provider implementations
pub mod anthropic;
pub mod openai;

// Construction and model-based selection
pub mod factory;
pub mod router;

// Re-export commonly used types
pub use factory::create_provider;
pub use router::{ProviderKind, ProviderRouter};
pub use translate::{translate, SystemPolicy, Translated};
pub use types::{LlmResponse, Message, ModelConfig, Role};

/// Incremental output of a streaming call
///
/// Yields text fragments in order. An `Err` item is terminal. Dropping the
/// receiver cancels the backend stream.
pub type FragmentStream = Receiver<Result<String>>;

/// Trait for LLM providers
///
/// Every backend adapter implements this trait. Implementations are shared
/// across concurrent requests, so they hold only read-only state (client and
/// credential).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Stable lowercase provider name (e.g., "anthropic", "openai")
    fn name(&self) -> &str;

    /// Send the conversation and wait for the full response
    ///
    /// Performs exactly one backend call; failures are returned, not retried.
    async fn complete(&self, messages: &[Message], config: &ModelConfig) -> Result<LlmResponse>;

    /// Send the conversation and stream the response text
    ///
    /// Translation errors and a failed initial request are returned directly;
    /// errors after the stream opens arrive as the final item of the stream.
    async fn stream(&self, messages: &[Message], config: &ModelConfig) -> Result<FragmentStream>;
}
