//! Built-in backend adapters, one module per platform.
//!
//! Each module contains the platform's wire types, the backend client trait
//! (the mockable network seam), a mock client, the [`ChatStrategy`] adapter,
//! and the [`ProviderFactory`]. Real deployments substitute a genuine network
//! client behind the client trait; nothing upstream of the adapter changes.
//!
//! [`ChatStrategy`]: crate::traits::ChatStrategy
//! [`ProviderFactory`]: crate::traits::ProviderFactory

mod azure;
mod bedrock;
mod google;
mod ollama;

pub use azure::{
    AzureChatMessage, AzureChatRequest, AzureChatResponse, AzureChatStrategy, AzureChoice,
    AzureFactory, AzureOpenAiApi, AzureUsage, MockAzureOpenAiApi,
};
pub use bedrock::{
    BedrockChatStrategy, BedrockFactory, BedrockInvokeRequest, BedrockInvokeResponse,
    BedrockRuntime, BedrockUsage, MockBedrockRuntime,
};
pub use google::{
    GoogleCandidate, GoogleChatStrategy, GoogleContent, GoogleFactory, GoogleGenerateRequest,
    GoogleGenerateResponse, GoogleGenerationConfig, GoogleGenerativeApi, GooglePart,
    GoogleUsageMetadata, MockGoogleGenerativeApi,
};
pub use ollama::{
    MockOllamaApi, OllamaApi, OllamaChatMessage, OllamaChatRequest, OllamaChatResponse,
    OllamaChatStrategy, OllamaChunkStream, OllamaFactory, OllamaModelOptions,
};

use std::sync::Arc;

use crate::registry::ProviderRegistry;
use crate::types::{ChatStream, StreamChunk};

/// Register all built-in provider factories, each with its mock backend
/// client. Called by [`ProviderRegistry::with_builtin_providers`].
pub fn register_builtin_providers(registry: &ProviderRegistry) {
    registry.register("bedrock", Arc::new(BedrockFactory::new()));
    registry.register("azure", Arc::new(AzureFactory::new()));
    registry.register("google", Arc::new(GoogleFactory::new()));
    registry.register("ollama", Arc::new(OllamaFactory::new()));
}

/// Turn a post-hoc decomposition of a complete response into a [`ChatStream`].
///
/// This is the synthesized-streaming path for backends with no native
/// incremental output. It is not performance-representative of true token
/// streaming — the full response already exists before the first chunk is
/// yielded. The final piece carries `is_last`; an empty decomposition still
/// yields exactly one terminal chunk with empty content.
pub(crate) fn synthesized_stream(model: &str, pieces: Vec<String>) -> ChatStream {
    let mut chunks: Vec<Result<StreamChunk, crate::error::LlmError>> = Vec::new();
    if pieces.is_empty() {
        chunks.push(Ok(StreamChunk::last(model, "")));
    } else {
        let last = pieces.len() - 1;
        for (i, piece) in pieces.into_iter().enumerate() {
            if i == last {
                chunks.push(Ok(StreamChunk::last(model, piece)));
            } else {
                chunks.push(Ok(StreamChunk::new(model, piece)));
            }
        }
    }
    Box::pin(futures::stream::iter(chunks))
}
