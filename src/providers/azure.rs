//! Azure OpenAI backend adapter.
//!
//! Azure speaks the chat-completions shape: a `messages` array in, a
//! `choices` array out, usage as `prompt_tokens` / `completion_tokens`.
//! Streaming is synthesized at sentence granularity (punctuation followed by
//! whitespace).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::LlmError;
use crate::traits::{ChatStrategy, ProviderFactory};
use crate::types::{ChatOptions, ChatResponse, ChatStream, Usage};

const PLATFORM_ID: &str = "azure";
const SUPPORTED_MODELS: &[&str] = &["gpt-4o-mini", "gpt-35-turbo", "gpt-4o"];

/// One chat-completions message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureChatMessage {
    pub role: String,
    pub content: String,
}

/// Chat-completions request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureChatRequest {
    /// Deployment (model) name.
    pub model: String,
    pub messages: Vec<AzureChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Opaque passthrough values.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureChoice {
    pub message: AzureChatMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Chat-completions response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureChatResponse {
    pub id: String,
    pub model: String,
    pub choices: Vec<AzureChoice>,
    pub usage: AzureUsage,
}

/// The Azure OpenAI service boundary.
#[async_trait]
pub trait AzureOpenAiApi: Send + Sync {
    async fn create_chat_completion(
        &self,
        request: &AzureChatRequest,
    ) -> Result<AzureChatResponse, LlmError>;
}

/// Deterministic in-process stand-in for the Azure OpenAI service.
#[derive(Debug, Default)]
pub struct MockAzureOpenAiApi;

impl MockAzureOpenAiApi {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AzureOpenAiApi for MockAzureOpenAiApi {
    async fn create_chat_completion(
        &self,
        request: &AzureChatRequest,
    ) -> Result<AzureChatResponse, LlmError> {
        let prompt = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        let content = format!(
            "Deployment {} acknowledges: {}. That is the short answer! A longer \
             one would follow from the live service.",
            request.model, prompt
        );
        let prompt_tokens = approx_tokens(prompt);
        let completion_tokens = approx_tokens(&content);
        Ok(AzureChatResponse {
            id: format!("chatcmpl-{}", request.model),
            model: request.model.clone(),
            choices: vec![AzureChoice {
                message: AzureChatMessage {
                    role: "assistant".to_string(),
                    content,
                },
                finish_reason: Some("stop".to_string()),
            }],
            usage: AzureUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
        })
    }
}

fn approx_tokens(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

/// Azure adapter: unified contract in, chat-completions shapes out.
pub struct AzureChatStrategy {
    api: Arc<dyn AzureOpenAiApi>,
    model_id: String,
}

impl AzureChatStrategy {
    pub fn new(api: Arc<dyn AzureOpenAiApi>, model_id: impl Into<String>) -> Self {
        Self {
            api,
            model_id: model_id.into(),
        }
    }

    fn build_request(&self, prompt: &str, options: &ChatOptions) -> AzureChatRequest {
        let mut messages = Vec::new();
        if let Some(system) = &options.system_prompt {
            messages.push(AzureChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(AzureChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });
        AzureChatRequest {
            model: self.model_id.clone(),
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            metadata: options.metadata.clone(),
        }
    }

    fn parse_response(&self, response: AzureChatResponse) -> Result<ChatResponse, LlmError> {
        let choice = response.choices.into_iter().next().ok_or_else(|| {
            LlmError::BackendError("Azure response contained no choices".to_string())
        })?;
        let mut additional_data = HashMap::new();
        additional_data.insert("id".to_string(), serde_json::Value::String(response.id));
        if let Some(reason) = choice.finish_reason {
            additional_data.insert(
                "finish_reason".to_string(),
                serde_json::Value::String(reason),
            );
        }
        Ok(ChatResponse {
            model: response.model,
            content: choice.message.content,
            usage: Usage::new(
                response.usage.prompt_tokens,
                response.usage.completion_tokens,
            ),
            additional_data,
        })
    }
}

#[async_trait]
impl ChatStrategy for AzureChatStrategy {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn send_message(
        &self,
        prompt: &str,
        options: &ChatOptions,
    ) -> Result<ChatResponse, LlmError> {
        tracing::debug!(model = %self.model_id, "azure chat completion");
        let request = self.build_request(prompt, options);
        let response = self.api.create_chat_completion(&request).await?;
        self.parse_response(response)
    }

    async fn stream_message(
        &self,
        prompt: &str,
        options: &ChatOptions,
    ) -> Result<ChatStream, LlmError> {
        // No native streaming: decompose a fresh full response at sentence
        // boundaries.
        let response = self.send_message(prompt, options).await?;
        let pieces = split_sentences(&response.content);
        Ok(super::synthesized_stream(&response.model, pieces))
    }
}

/// Split into sentence-granularity pieces: a cut happens after a run of
/// whitespace that follows `.`, `!` or `?`. Concatenation reconstructs the
/// original text exactly.
fn split_sentences(content: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut after_punctuation = false;
    for ch in content.chars() {
        if after_punctuation && !ch.is_whitespace() {
            pieces.push(std::mem::take(&mut current));
            after_punctuation = false;
        }
        if !ch.is_whitespace() {
            after_punctuation = matches!(ch, '.' | '!' | '?');
        }
        current.push(ch);
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Factory for Azure adapters, holding the shared service handle.
pub struct AzureFactory {
    api: Arc<dyn AzureOpenAiApi>,
}

impl AzureFactory {
    /// Factory backed by the mock service.
    pub fn new() -> Self {
        Self::with_api(Arc::new(MockAzureOpenAiApi::new()))
    }

    /// Factory backed by a caller-supplied service client.
    pub fn with_api(api: Arc<dyn AzureOpenAiApi>) -> Self {
        Self { api }
    }
}

impl Default for AzureFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderFactory for AzureFactory {
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
        Ok(Arc::new(AzureChatStrategy::new(self.api.clone(), model_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[test]
    fn test_build_request_places_system_first() {
        let strategy = AzureChatStrategy::new(Arc::new(MockAzureOpenAiApi::new()), "gpt-4o");
        let options = ChatOptions::new().with_system_prompt("be precise");

        let request = strategy.build_request("What is Rust?", &options);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[1].role, "user");
        assert_eq!(request.messages[1].content, "What is Rust?");
    }

    #[test]
    fn test_split_sentences_is_lossless() {
        let text = "First sentence. Second one! Third? Trailing fragment";
        let pieces = split_sentences(text);
        assert_eq!(pieces.len(), 4);
        assert_eq!(pieces.concat(), text);
    }

    #[tokio::test]
    async fn test_send_message_maps_usage_and_extras() {
        let strategy = AzureChatStrategy::new(Arc::new(MockAzureOpenAiApi::new()), "gpt-4o-mini");
        let response = strategy
            .send_message("hello", &ChatOptions::new())
            .await
            .unwrap();

        assert_eq!(response.model, "gpt-4o-mini");
        assert_eq!(
            response.usage.total_tokens,
            response.usage.prompt_tokens + response.usage.completion_tokens
        );
        assert!(response.additional_data.contains_key("id"));
        assert!(response.additional_data.contains_key("finish_reason"));
    }

    #[tokio::test]
    async fn test_stream_reconstructs_send_content() {
        let strategy = AzureChatStrategy::new(Arc::new(MockAzureOpenAiApi::new()), "gpt-35-turbo");
        let options = ChatOptions::new();

        let full = strategy.send_message("hi", &options).await.unwrap();
        let chunks: Vec<_> = strategy
            .stream_message("hi", &options)
            .await
            .unwrap()
            .map(|c| c.unwrap())
            .collect()
            .await;

        // Sentence granularity: more than one chunk for multi-sentence text.
        assert!(chunks.len() > 1);
        let streamed: String = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(streamed, full.content);
        assert_eq!(chunks.iter().filter(|c| c.is_last).count(), 1);
        assert!(chunks.last().unwrap().is_last);
    }

    #[test]
    fn test_factory_rejects_unlisted_model() {
        let factory = AzureFactory::new();
        assert!(matches!(
            factory.create_client("llama3").unwrap_err(),
            LlmError::UnsupportedModel { .. }
        ));
    }
}
