//! Strategy and factory contracts.
//!
//! [`ChatStrategy`] is the polymorphic seam every backend adapter implements;
//! [`ProviderFactory`] validates a model id against its platform's allowlist
//! and constructs the matching adapter. Callers hold both behind `Arc<dyn _>`
//! so backends are resolved by name at runtime, never by concrete type.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::LlmError;
use crate::types::{ChatOptions, ChatResponse, ChatStream};

/// A single backend adapter: one uniform request/response contract over one
/// concrete LLM backend.
///
/// Both operations suspend only at the backend-call boundary. A backend
/// failure is not retried and not recovered locally: the pending result (or
/// the stream, before any chunk is emitted) fails atomically.
#[async_trait]
pub trait ChatStrategy: Send + Sync {
    /// The model id this adapter was constructed for.
    fn model_id(&self) -> &str;

    /// Send a single-shot message and return the unified response.
    ///
    /// The adapter owns the field translation in both directions: options
    /// into whatever request shape the backend expects, and the backend's
    /// response (differing usage field names, content nesting) back into
    /// [`ChatResponse`], with `usage.total_tokens` computed as the sum of
    /// the backend's reported prompt and completion counts.
    async fn send_message(
        &self,
        prompt: &str,
        options: &ChatOptions,
    ) -> Result<ChatResponse, LlmError>;

    /// Send a message and consume the response incrementally.
    ///
    /// Backends without native incremental output get a synthesized
    /// sequence: the adapter obtains the full [`send_message`] result and
    /// splits its content at a backend-defined granularity. Either way the
    /// produced sequence is finite, not restartable, and terminates with
    /// exactly one `is_last` chunk.
    ///
    /// [`send_message`]: ChatStrategy::send_message
    async fn stream_message(
        &self,
        prompt: &str,
        options: &ChatOptions,
    ) -> Result<ChatStream, LlmError>;
}

impl std::fmt::Debug for dyn ChatStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatStrategy")
            .field("model_id", &self.model_id())
            .finish_non_exhaustive()
    }
}

/// Constructs [`ChatStrategy`] adapters for one platform.
///
/// The allowlist is plain data: adding a platform is one factory plus one
/// adapter, never a switch-statement edit elsewhere.
pub trait ProviderFactory: Send + Sync {
    /// Canonical platform id this factory is registered under.
    fn platform_id(&self) -> &'static str;

    /// The fixed, ordered set of model ids this platform supports.
    fn supported_models(&self) -> &'static [&'static str];

    /// Validate `model_id` against the allowlist and construct the adapter.
    ///
    /// Membership is exact string equality — no fuzzy matching, no fallback.
    /// Construction is cheap and side-effect-free; no backend call happens
    /// here. Fails with [`LlmError::UnsupportedModel`] naming the platform
    /// and the rejected id.
    fn create_client(&self, model_id: &str) -> Result<Arc<dyn ChatStrategy>, LlmError>;
}

impl std::fmt::Debug for dyn ProviderFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderFactory")
            .field("platform_id", &self.platform_id())
            .finish_non_exhaustive()
    }
}
