//! Google Generative Language backend adapter.
//!
//! Gemini nests content under `candidates[].content.parts[].text` and reports
//! usage in camelCase as `promptTokenCount` / `candidatesTokenCount`.
//! Streaming is synthesized as fixed-size character windows.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::LlmError;
use crate::traits::{ChatStrategy, ProviderFactory};
use crate::types::{ChatOptions, ChatResponse, ChatStream, Usage};

const PLATFORM_ID: &str = "google";
const SUPPORTED_MODELS: &[&str] = &["gemini-pro", "gemini-1.0-pro", "text-unicorn-latest"];

/// Window size for synthesized character streaming.
const STREAM_WINDOW_CHARS: usize = 24;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GooglePart {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<GooglePart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// `generateContent` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleGenerateRequest {
    pub model: String,
    pub contents: Vec<GoogleContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GoogleContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GoogleGenerationConfig>,
    /// Opaque passthrough values.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleUsageMetadata {
    pub prompt_token_count: u32,
    pub candidates_token_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleCandidate {
    pub content: GoogleContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// `generateContent` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleGenerateResponse {
    pub candidates: Vec<GoogleCandidate>,
    pub usage_metadata: GoogleUsageMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

/// The Generative Language service boundary.
#[async_trait]
pub trait GoogleGenerativeApi: Send + Sync {
    async fn generate_content(
        &self,
        request: &GoogleGenerateRequest,
    ) -> Result<GoogleGenerateResponse, LlmError>;
}

/// Deterministic in-process stand-in for the Generative Language service.
#[derive(Debug, Default)]
pub struct MockGoogleGenerativeApi;

impl MockGoogleGenerativeApi {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GoogleGenerativeApi for MockGoogleGenerativeApi {
    async fn generate_content(
        &self,
        request: &GoogleGenerateRequest,
    ) -> Result<GoogleGenerateResponse, LlmError> {
        let prompt = request
            .contents
            .iter()
            .flat_map(|c| c.parts.iter())
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let text = format!(
            "{} generated a reply for: {}. Real candidates would carry richer \
             content than this mock does.",
            request.model, prompt
        );
        Ok(GoogleGenerateResponse {
            usage_metadata: GoogleUsageMetadata {
                prompt_token_count: approx_tokens(&prompt),
                candidates_token_count: approx_tokens(&text),
            },
            candidates: vec![GoogleCandidate {
                content: GoogleContent {
                    role: Some("model".to_string()),
                    parts: vec![GooglePart { text }],
                },
                finish_reason: Some("STOP".to_string()),
            }],
            model_version: Some(request.model.clone()),
        })
    }
}

fn approx_tokens(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

/// Google adapter: unified contract in, `generateContent` shapes out.
pub struct GoogleChatStrategy {
    api: Arc<dyn GoogleGenerativeApi>,
    model_id: String,
}

impl GoogleChatStrategy {
    pub fn new(api: Arc<dyn GoogleGenerativeApi>, model_id: impl Into<String>) -> Self {
        Self {
            api,
            model_id: model_id.into(),
        }
    }

    fn build_request(&self, prompt: &str, options: &ChatOptions) -> GoogleGenerateRequest {
        let generation_config = if options.temperature.is_some() || options.max_tokens.is_some() {
            Some(GoogleGenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_tokens,
            })
        } else {
            None
        };
        GoogleGenerateRequest {
            model: self.model_id.clone(),
            contents: vec![GoogleContent {
                role: Some("user".to_string()),
                parts: vec![GooglePart {
                    text: prompt.to_string(),
                }],
            }],
            system_instruction: options.system_prompt.as_ref().map(|s| GoogleContent {
                role: None,
                parts: vec![GooglePart { text: s.clone() }],
            }),
            generation_config,
            labels: options.metadata.clone(),
        }
    }

    fn parse_response(&self, response: GoogleGenerateResponse) -> Result<ChatResponse, LlmError> {
        let candidate = response.candidates.into_iter().next().ok_or_else(|| {
            LlmError::BackendError("Google response contained no candidates".to_string())
        })?;
        let content = candidate
            .content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect::<String>();
        let mut additional_data = HashMap::new();
        if let Some(reason) = candidate.finish_reason {
            additional_data.insert(
                "finish_reason".to_string(),
                serde_json::Value::String(reason),
            );
        }
        Ok(ChatResponse {
            model: response.model_version.unwrap_or_else(|| self.model_id.clone()),
            content,
            usage: Usage::new(
                response.usage_metadata.prompt_token_count,
                response.usage_metadata.candidates_token_count,
            ),
            additional_data,
        })
    }
}

#[async_trait]
impl ChatStrategy for GoogleChatStrategy {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn send_message(
        &self,
        prompt: &str,
        options: &ChatOptions,
    ) -> Result<ChatResponse, LlmError> {
        tracing::debug!(model = %self.model_id, "google generate_content");
        let request = self.build_request(prompt, options);
        let response = self.api.generate_content(&request).await?;
        self.parse_response(response)
    }

    async fn stream_message(
        &self,
        prompt: &str,
        options: &ChatOptions,
    ) -> Result<ChatStream, LlmError> {
        // No native streaming: decompose a fresh full response into
        // fixed-size character windows.
        let response = self.send_message(prompt, options).await?;
        let pieces = split_char_windows(&response.content, STREAM_WINDOW_CHARS);
        Ok(super::synthesized_stream(&response.model, pieces))
    }
}

/// Split into windows of at most `window` characters, respecting char
/// boundaries. Concatenation reconstructs the original text exactly.
fn split_char_windows(content: &str, window: usize) -> Vec<String> {
    let chars: Vec<char> = content.chars().collect();
    chars
        .chunks(window)
        .map(|c| c.iter().collect::<String>())
        .collect()
}

/// Factory for Google adapters, holding the shared service handle.
pub struct GoogleFactory {
    api: Arc<dyn GoogleGenerativeApi>,
}

impl GoogleFactory {
    /// Factory backed by the mock service.
    pub fn new() -> Self {
        Self::with_api(Arc::new(MockGoogleGenerativeApi::new()))
    }

    /// Factory backed by a caller-supplied service client.
    pub fn with_api(api: Arc<dyn GoogleGenerativeApi>) -> Self {
        Self { api }
    }
}

impl Default for GoogleFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderFactory for GoogleFactory {
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
        Ok(Arc::new(GoogleChatStrategy::new(
            self.api.clone(),
            model_id,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[test]
    fn test_build_request_nests_prompt_in_parts() {
        let strategy = GoogleChatStrategy::new(Arc::new(MockGoogleGenerativeApi::new()), "gemini-pro");
        let options = ChatOptions::new().with_temperature(0.6).with_system_prompt("short");

        let request = strategy.build_request("hello", &options);
        assert_eq!(request.contents.len(), 1);
        assert_eq!(request.contents[0].parts[0].text, "hello");
        assert!(request.system_instruction.is_some());
        assert_eq!(
            request.generation_config.as_ref().unwrap().temperature,
            Some(0.6)
        );
    }

    #[test]
    fn test_wire_types_serialize_camel_case() {
        let config = GoogleGenerationConfig {
            temperature: Some(0.1),
            max_output_tokens: Some(64),
        };
        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("maxOutputTokens").is_some());

        let usage: GoogleUsageMetadata = serde_json::from_value(serde_json::json!({
            "promptTokenCount": 3,
            "candidatesTokenCount": 5,
        }))
        .unwrap();
        assert_eq!(usage.prompt_token_count, 3);
        assert_eq!(usage.candidates_token_count, 5);
    }

    #[test]
    fn test_split_char_windows_is_lossless() {
        let text = "héllo wörld, this spans multiple windows";
        let pieces = split_char_windows(text, 7);
        assert!(pieces.iter().all(|p| p.chars().count() <= 7));
        assert_eq!(pieces.concat(), text);
    }

    #[tokio::test]
    async fn test_send_message_sums_usage() {
        let strategy =
            GoogleChatStrategy::new(Arc::new(MockGoogleGenerativeApi::new()), "gemini-1.0-pro");
        let response = strategy
            .send_message("hello", &ChatOptions::new())
            .await
            .unwrap();

        assert_eq!(response.model, "gemini-1.0-pro");
        assert_eq!(
            response.usage.total_tokens,
            response.usage.prompt_tokens + response.usage.completion_tokens
        );
    }

    #[tokio::test]
    async fn test_stream_reconstructs_send_content() {
        let strategy =
            GoogleChatStrategy::new(Arc::new(MockGoogleGenerativeApi::new()), "text-unicorn-latest");
        let options = ChatOptions::new();

        let full = strategy.send_message("ping", &options).await.unwrap();
        let chunks: Vec<_> = strategy
            .stream_message("ping", &options)
            .await
            .unwrap()
            .map(|c| c.unwrap())
            .collect()
            .await;

        let streamed: String = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(streamed, full.content);
        assert_eq!(chunks.iter().filter(|c| c.is_last).count(), 1);
        assert!(chunks.last().unwrap().is_last);
    }

    #[test]
    fn test_factory_rejects_unlisted_model() {
        let factory = GoogleFactory::new();
        assert!(matches!(
            factory.create_client("gemini-ultra").unwrap_err(),
            LlmError::UnsupportedModel { platform, model }
                if platform == "google" && model == "gemini-ultra"
        ));
    }
}
