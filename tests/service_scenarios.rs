//! End-to-end scenarios: registry extension, configuration mistakes, and the
//! in-flight-adapter guarantee across a re-configure.

use async_trait::async_trait;
use futures_util::StreamExt;
use omnichat::prelude::*;
use omnichat::providers::{
    BedrockFactory, BedrockInvokeRequest, BedrockInvokeResponse, BedrockRuntime,
};
use std::sync::Arc;

/// Minimal custom platform ("x" with one model "m1") registered alongside
/// the built-ins — adding a platform is one factory plus one adapter.
struct FixedReplyStrategy {
    model_id: String,
}

#[async_trait]
impl ChatStrategy for FixedReplyStrategy {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn send_message(
        &self,
        prompt: &str,
        _options: &ChatOptions,
    ) -> Result<ChatResponse, LlmError> {
        Ok(ChatResponse {
            model: self.model_id.clone(),
            content: format!("echo: {prompt}"),
            usage: Usage::new(1, 2),
            additional_data: Default::default(),
        })
    }

    async fn stream_message(
        &self,
        prompt: &str,
        options: &ChatOptions,
    ) -> Result<ChatStream, LlmError> {
        let response = self.send_message(prompt, options).await?;
        Ok(Box::pin(futures::stream::iter(vec![Ok(StreamChunk {
            model: response.model,
            content: response.content,
            is_last: true,
        })])))
    }
}

struct XFactory;

impl ProviderFactory for XFactory {
    fn platform_id(&self) -> &'static str {
        "x"
    }

    fn supported_models(&self) -> &'static [&'static str] {
        &["m1"]
    }

    fn create_client(&self, model_id: &str) -> Result<Arc<dyn ChatStrategy>, LlmError> {
        if model_id != "m1" {
            return Err(LlmError::UnsupportedModel {
                platform: "x".to_string(),
                model: model_id.to_string(),
            });
        }
        Ok(Arc::new(FixedReplyStrategy {
            model_id: model_id.to_string(),
        }))
    }
}

#[tokio::test]
async fn custom_platform_round_trip() {
    let registry = Arc::new(ProviderRegistry::new());
    registry.register("x", Arc::new(XFactory));

    let service = ChatService::new(registry);
    service.configure(ProviderSelection::new("x", "m1")).unwrap();

    let response = service.send("hello", &ChatOptions::new()).await.unwrap();
    assert_eq!(response.model, "m1");
    assert_eq!(response.usage.total_tokens, 3);
}

#[test]
fn custom_platform_unknown_model_names_both() {
    let registry = Arc::new(ProviderRegistry::new());
    registry.register("x", Arc::new(XFactory));

    let service = ChatService::new(registry);
    let err = service
        .configure(ProviderSelection::new("x", "unknown"))
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains('x'));
    assert!(msg.contains("unknown"));
}

/// A runtime whose every call fails, standing in for a dead backend.
struct UnreachableBedrockRuntime;

#[async_trait]
impl BedrockRuntime for UnreachableBedrockRuntime {
    async fn invoke_model(
        &self,
        _request: &BedrockInvokeRequest,
    ) -> Result<BedrockInvokeResponse, LlmError> {
        Err(LlmError::BackendError("connection reset by peer".to_string()))
    }
}

#[tokio::test]
async fn backend_failure_propagates_unmodified() {
    let registry = Arc::new(ProviderRegistry::new());
    registry.register(
        "bedrock",
        Arc::new(BedrockFactory::with_runtime(Arc::new(
            UnreachableBedrockRuntime,
        ))),
    );

    let service = ChatService::new(registry);
    service
        .configure(ProviderSelection::new("bedrock", "anthropic.claude-v2"))
        .unwrap();

    // The adapter and the façade forward the failure as-is, message intact.
    let err = service.send("hi", &ChatOptions::new()).await.unwrap_err();
    assert!(matches!(
        &err,
        LlmError::BackendError(msg) if msg == "connection reset by peer"
    ));

    // Streaming fails before any chunk is produced.
    let err = service.stream("hi", &ChatOptions::new()).await.unwrap_err();
    assert!(matches!(
        &err,
        LlmError::BackendError(msg) if msg == "connection reset by peer"
    ));
}

#[tokio::test]
async fn fresh_service_send_is_not_configured() {
    let service = ChatService::new(Arc::new(ProviderRegistry::new()));
    let err = service.send("hi", &ChatOptions::new()).await.unwrap_err();
    assert!(matches!(err, LlmError::NotConfigured));
}

#[tokio::test]
async fn configured_service_never_regresses_to_not_configured() {
    let registry = Arc::new(ProviderRegistry::with_builtin_providers());
    let service = ChatService::new(registry);
    service
        .configure(ProviderSelection::new("azure", "gpt-4o"))
        .unwrap();

    for _ in 0..3 {
        assert!(service.send("hi", &ChatOptions::new()).await.is_ok());
        assert!(service.stream("hi", &ChatOptions::new()).await.is_ok());
    }
}

#[tokio::test]
async fn in_flight_stream_keeps_its_adapter_across_reconfigure() {
    let registry = Arc::new(ProviderRegistry::with_builtin_providers());
    let service = ChatService::new(registry);
    service
        .configure(ProviderSelection::new("ollama", "llama3"))
        .unwrap();

    // Obtain the stream, then switch backends before consuming it.
    let stream = service.stream("ping", &ChatOptions::new()).await.unwrap();
    service
        .configure(ProviderSelection::new("azure", "gpt-4o"))
        .unwrap();

    let chunks: Vec<_> = stream.map(|c| c.unwrap()).collect().await;
    assert!(chunks.iter().all(|c| c.model == "llama3"));

    // Subsequent calls use the new adapter.
    let response = service.send("ping", &ChatOptions::new()).await.unwrap();
    assert_eq!(response.model, "gpt-4o");
}

#[tokio::test]
async fn builder_end_to_end_with_defaults() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("omnichat=debug")
        .with_test_writer()
        .try_init();

    let registry = Arc::new(ProviderRegistry::with_builtin_providers());
    let client = ChatClientBuilder::new()
        .registry(registry)
        .platform("google")
        .model("gemini-pro")
        .default_options(ChatOptions::new().with_system_prompt("keep it short"))
        .build()
        .unwrap();

    let response = client.send("hello", &ChatOptions::new()).await.unwrap();
    assert_eq!(response.model, "gemini-pro");

    let chunks: Vec<_> = client
        .stream("hello", &ChatOptions::new())
        .await
        .unwrap()
        .map(|c| c.unwrap())
        .collect()
        .await;
    assert!(chunks.last().unwrap().is_last);
}

#[test]
fn builder_missing_field_regardless_of_order() {
    for build in [
        ChatClientBuilder::new().model("m1"),
        ChatClientBuilder::new().model("m1").platform(""),
        ChatClientBuilder::new(),
    ] {
        let err = build
            .registry(Arc::new(ProviderRegistry::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, LlmError::MissingField("platform")));
    }

    let err = ChatClientBuilder::new()
        .platform("x")
        .registry(Arc::new(ProviderRegistry::new()))
        .build()
        .unwrap_err();
    assert!(matches!(err, LlmError::MissingField("model")));
}

#[test]
fn registry_clear_isolates_tests() {
    let registry = ProviderRegistry::with_builtin_providers();
    registry.clear();
    assert!(registry.list_platforms().is_empty());

    registry.register("x", Arc::new(XFactory));
    assert_eq!(registry.list_platforms(), vec!["x".to_string()]);
}
