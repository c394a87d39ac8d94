//! Ollama backend adapter.
//!
//! Ollama reports usage as `prompt_eval_count` / `eval_count` and is the one
//! built-in backend with native incremental streaming: the client trait
//! exposes a true chunk stream (NDJSON in the real protocol) and the adapter
//! forwards its increments instead of synthesizing them from a complete
//! response.

use async_trait::async_trait;
use futures::Stream;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::LlmError;
use crate::traits::{ChatStrategy, ProviderFactory};
use crate::types::{ChatOptions, ChatResponse, ChatStream, StreamChunk, Usage};

const PLATFORM_ID: &str = "ollama";
const SUPPORTED_MODELS: &[&str] = &["llama3", "mistral", "codellama"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OllamaModelOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
}

/// `/api/chat` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaChatRequest {
    pub model: String,
    pub messages: Vec<OllamaChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OllamaModelOptions>,
    /// Opaque passthrough values, flattened into the request body.
    #[serde(flatten)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// `/api/chat` response body. Streamed NDJSON chunks share this shape:
/// intermediate chunks carry a content fragment with `done == false`, the
/// final chunk carries `done == true` and the eval counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaChatResponse {
    pub model: String,
    pub message: OllamaChatMessage,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<u64>,
}

/// Stream of raw Ollama chunks as the backend emits them.
pub type OllamaChunkStream =
    Pin<Box<dyn Stream<Item = Result<OllamaChatResponse, LlmError>> + Send>>;

/// The Ollama server boundary.
///
/// Contract for `chat_stream`: chunks arrive in generation order and exactly
/// the final chunk has `done == true`.
#[async_trait]
pub trait OllamaApi: Send + Sync {
    async fn chat(&self, request: &OllamaChatRequest) -> Result<OllamaChatResponse, LlmError>;

    async fn chat_stream(
        &self,
        request: &OllamaChatRequest,
    ) -> Result<OllamaChunkStream, LlmError>;
}

/// Deterministic in-process stand-in for an Ollama server.
#[derive(Debug, Default)]
pub struct MockOllamaApi;

impl MockOllamaApi {
    pub fn new() -> Self {
        Self
    }

    fn completion(request: &OllamaChatRequest) -> String {
        let prompt = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        format!(
            "{} ran locally and replies to: {}. Tokens arrive one batch at a time.",
            request.model, prompt
        )
    }
}

#[async_trait]
impl OllamaApi for MockOllamaApi {
    async fn chat(&self, request: &OllamaChatRequest) -> Result<OllamaChatResponse, LlmError> {
        let content = Self::completion(request);
        let prompt_text = request
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Ok(OllamaChatResponse {
            model: request.model.clone(),
            prompt_eval_count: Some(approx_tokens(&prompt_text)),
            eval_count: Some(approx_tokens(&content)),
            message: OllamaChatMessage {
                role: "assistant".to_string(),
                content,
            },
            done: true,
            total_duration: Some(1_000_000),
        })
    }

    async fn chat_stream(
        &self,
        request: &OllamaChatRequest,
    ) -> Result<OllamaChunkStream, LlmError> {
        let full = self.chat(request).await?;
        let model = full.model.clone();

        // Emit word-sized increments, then the terminal bookkeeping chunk,
        // mirroring the server's NDJSON sequence.
        let mut chunks: Vec<Result<OllamaChatResponse, LlmError>> = full
            .message
            .content
            .split_inclusive(char::is_whitespace)
            .map(|piece| {
                Ok(OllamaChatResponse {
                    model: model.clone(),
                    message: OllamaChatMessage {
                        role: "assistant".to_string(),
                        content: piece.to_string(),
                    },
                    done: false,
                    prompt_eval_count: None,
                    eval_count: None,
                    total_duration: None,
                })
            })
            .collect();
        chunks.push(Ok(OllamaChatResponse {
            model,
            message: OllamaChatMessage {
                role: "assistant".to_string(),
                content: String::new(),
            },
            done: true,
            prompt_eval_count: full.prompt_eval_count,
            eval_count: full.eval_count,
            total_duration: full.total_duration,
        }));
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

fn approx_tokens(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

/// Ollama adapter: unified contract in, `/api/chat` shapes out.
pub struct OllamaChatStrategy {
    api: Arc<dyn OllamaApi>,
    model_id: String,
}

impl OllamaChatStrategy {
    pub fn new(api: Arc<dyn OllamaApi>, model_id: impl Into<String>) -> Self {
        Self {
            api,
            model_id: model_id.into(),
        }
    }

    fn build_request(&self, prompt: &str, options: &ChatOptions, stream: bool) -> OllamaChatRequest {
        let mut messages = Vec::new();
        if let Some(system) = &options.system_prompt {
            messages.push(OllamaChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(OllamaChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });
        let model_options = if options.temperature.is_some() || options.max_tokens.is_some() {
            Some(OllamaModelOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            })
        } else {
            None
        };
        OllamaChatRequest {
            model: self.model_id.clone(),
            messages,
            stream: Some(stream),
            options: model_options,
            metadata: options.metadata.clone(),
        }
    }

    fn parse_response(&self, response: OllamaChatResponse) -> ChatResponse {
        let mut additional_data = HashMap::new();
        if let Some(duration) = response.total_duration {
            additional_data.insert("total_duration".to_string(), serde_json::json!(duration));
        }
        ChatResponse {
            model: response.model,
            content: response.message.content,
            usage: Usage::new(
                response.prompt_eval_count.unwrap_or(0),
                response.eval_count.unwrap_or(0),
            ),
            additional_data,
        }
    }
}

#[async_trait]
impl ChatStrategy for OllamaChatStrategy {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn send_message(
        &self,
        prompt: &str,
        options: &ChatOptions,
    ) -> Result<ChatResponse, LlmError> {
        tracing::debug!(model = %self.model_id, "ollama chat");
        let request = self.build_request(prompt, options, false);
        let response = self.api.chat(&request).await?;
        Ok(self.parse_response(response))
    }

    async fn stream_message(
        &self,
        prompt: &str,
        options: &ChatOptions,
    ) -> Result<ChatStream, LlmError> {
        // Native streaming path: forward the backend's own increments.
        tracing::debug!(model = %self.model_id, "ollama chat (streaming)");
        let request = self.build_request(prompt, options, true);
        let chunks = self.api.chat_stream(&request).await?;
        let stream = chunks.map(|item| {
            item.map(|chunk| StreamChunk {
                model: chunk.model,
                content: chunk.message.content,
                is_last: chunk.done,
            })
        });
        Ok(Box::pin(stream))
    }
}

/// Factory for Ollama adapters, holding the shared server handle.
pub struct OllamaFactory {
    api: Arc<dyn OllamaApi>,
}

impl OllamaFactory {
    /// Factory backed by the mock server.
    pub fn new() -> Self {
        Self::with_api(Arc::new(MockOllamaApi::new()))
    }

    /// Factory backed by a caller-supplied server client.
    pub fn with_api(api: Arc<dyn OllamaApi>) -> Self {
        Self { api }
    }
}

impl Default for OllamaFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderFactory for OllamaFactory {
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
        Ok(Arc::new(OllamaChatStrategy::new(
            self.api.clone(),
            model_id,
        )))
    }
}
