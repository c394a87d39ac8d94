//! Amazon Bedrock backend adapter.
//!
//! Bedrock reports usage as `input_tokens` / `output_tokens` and nests the
//! generated text under `completion`. It has no native incremental streaming
//! here, so [`BedrockChatStrategy::stream_message`] synthesizes a chunk
//! sequence at whitespace-delimited word granularity.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::LlmError;
use crate::traits::{ChatStrategy, ProviderFactory};
use crate::types::{ChatOptions, ChatResponse, ChatStream, Usage};

const PLATFORM_ID: &str = "bedrock";
const SUPPORTED_MODELS: &[&str] = &["anthropic.claude-v2", "mistral.large", "meta.llama2-70b"];

/// Request body for the Bedrock `InvokeModel` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BedrockInvokeRequest {
    /// Target model id.
    pub model_id: String,
    /// The user prompt.
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens_to_sample: Option<u32>,
    /// Opaque passthrough values.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Usage block as Bedrock reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BedrockUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Response body of the Bedrock `InvokeModel` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BedrockInvokeResponse {
    pub model: String,
    pub completion: String,
    pub usage: BedrockUsage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

/// The Bedrock runtime boundary.
///
/// A real deployment implements this over the AWS SDK; the built-in factory
/// wires in [`MockBedrockRuntime`]. Swapping one for the other changes
/// nothing upstream of the adapter.
#[async_trait]
pub trait BedrockRuntime: Send + Sync {
    async fn invoke_model(
        &self,
        request: &BedrockInvokeRequest,
    ) -> Result<BedrockInvokeResponse, LlmError>;
}

/// Deterministic in-process stand-in for the Bedrock runtime.
#[derive(Debug, Default)]
pub struct MockBedrockRuntime;

impl MockBedrockRuntime {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BedrockRuntime for MockBedrockRuntime {
    async fn invoke_model(
        &self,
        request: &BedrockInvokeRequest,
    ) -> Result<BedrockInvokeResponse, LlmError> {
        let completion = format!(
            "Bedrock model {} received your prompt. Here is a considered reply to \"{}\". \
             Further detail would come from the real runtime.",
            request.model_id, request.prompt
        );
        Ok(BedrockInvokeResponse {
            model: request.model_id.clone(),
            usage: BedrockUsage {
                input_tokens: approx_tokens(&request.prompt),
                output_tokens: approx_tokens(&completion),
            },
            completion,
            stop_reason: Some("end_turn".to_string()),
        })
    }
}

fn approx_tokens(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

/// Bedrock adapter: unified contract in, `InvokeModel` shapes out.
pub struct BedrockChatStrategy {
    runtime: Arc<dyn BedrockRuntime>,
    model_id: String,
}

impl BedrockChatStrategy {
    pub fn new(runtime: Arc<dyn BedrockRuntime>, model_id: impl Into<String>) -> Self {
        Self {
            runtime,
            model_id: model_id.into(),
        }
    }

    fn build_request(&self, prompt: &str, options: &ChatOptions) -> BedrockInvokeRequest {
        BedrockInvokeRequest {
            model_id: self.model_id.clone(),
            prompt: prompt.to_string(),
            system: options.system_prompt.clone(),
            temperature: options.temperature,
            max_tokens_to_sample: options.max_tokens,
            metadata: options.metadata.clone(),
        }
    }

    fn parse_response(&self, response: BedrockInvokeResponse) -> ChatResponse {
        let mut additional_data = HashMap::new();
        if let Some(reason) = response.stop_reason {
            additional_data.insert("stop_reason".to_string(), serde_json::Value::String(reason));
        }
        ChatResponse {
            model: response.model,
            content: response.completion,
            usage: Usage::new(response.usage.input_tokens, response.usage.output_tokens),
            additional_data,
        }
    }
}

#[async_trait]
impl ChatStrategy for BedrockChatStrategy {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn send_message(
        &self,
        prompt: &str,
        options: &ChatOptions,
    ) -> Result<ChatResponse, LlmError> {
        tracing::debug!(model = %self.model_id, "bedrock invoke_model");
        let request = self.build_request(prompt, options);
        let response = self.runtime.invoke_model(&request).await?;
        Ok(self.parse_response(response))
    }

    async fn stream_message(
        &self,
        prompt: &str,
        options: &ChatOptions,
    ) -> Result<ChatStream, LlmError> {
        // No native streaming: decompose a fresh full response into
        // whitespace-delimited words.
        let response = self.send_message(prompt, options).await?;
        let pieces = split_words(&response.content);
        Ok(super::synthesized_stream(&response.model, pieces))
    }
}

/// Split into word-granularity pieces, each keeping its trailing whitespace
/// so concatenation reconstructs the original text exactly.
fn split_words(content: &str) -> Vec<String> {
    content
        .split_inclusive(char::is_whitespace)
        .map(str::to_string)
        .collect()
}

/// Factory for Bedrock adapters, holding the shared runtime handle.
pub struct BedrockFactory {
    runtime: Arc<dyn BedrockRuntime>,
}

impl BedrockFactory {
    /// Factory backed by the mock runtime.
    pub fn new() -> Self {
        Self::with_runtime(Arc::new(MockBedrockRuntime::new()))
    }

    /// Factory backed by a caller-supplied runtime (the real-client swap).
    pub fn with_runtime(runtime: Arc<dyn BedrockRuntime>) -> Self {
        Self { runtime }
    }
}

impl Default for BedrockFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderFactory for BedrockFactory {
    fn platform_id(&self) -> &'static str {
        PLATFORM_ID
    }

    fn supported_models(&self) -> &'static [&'static str] {
        SUPPORTED_MODELS
    }

    fn create_client(&self, model_id: &str) -> Result<Arc<dyn ChatStrategy>, LlmError> {
        if !SUPPORTED_MODELS.contains(&model_id) {
            return Err(LlmError::UnsupportedModel {
                platform: PLATFORM_ID.to_string(),
                model: model_id.to_string(),
            });
        }
        Ok(Arc::new(BedrockChatStrategy::new(
            self.runtime.clone(),
            model_id,
        )))
    }
}
