//! Fluent client builder.
//!
//! Accumulates a platform/model selection and default options across fluent
//! calls, validates at `build()`, and produces a [`ChatClient`] whose calls
//! merge the stored defaults with per-call options (per-call wins field by
//! field).

use std::sync::Arc;

use crate::error::LlmError;
use crate::registry::ProviderRegistry;
use crate::service::ChatService;
use crate::types::{ChatOptions, ChatResponse, ChatStream, ProviderSelection};

/// Builder for a configured [`ChatClient`].
#[derive(Default)]
pub struct ChatClientBuilder {
    platform: Option<String>,
    model: Option<String>,
    defaults: ChatOptions,
    registry: Option<Arc<ProviderRegistry>>,
}

impl ChatClientBuilder {
    /// Start an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the platform. A later call overrides an earlier one.
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    /// Select the model. A later call overrides an earlier one.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Merge `options` into the accumulated defaults, later calls overriding
    /// earlier ones for overlapping fields.
    pub fn default_options(mut self, options: ChatOptions) -> Self {
        self.defaults = self.defaults.merge(&options);
        self
    }

    /// Resolve platforms through `registry` instead of the global one.
    pub fn registry(mut self, registry: Arc<ProviderRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Validate the accumulated state and configure a client.
    ///
    /// Fails with [`LlmError::MissingField`] naming whichever of platform or
    /// model is unset or empty; resolution failures surface as
    /// [`LlmError::NotRegistered`] / [`LlmError::UnsupportedModel`].
    pub fn build(self) -> Result<ChatClient, LlmError> {
        let platform = match self.platform.as_deref() {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => return Err(LlmError::MissingField("platform")),
        };
        let model = match self.model.as_deref() {
            Some(m) if !m.is_empty() => m.to_string(),
            _ => return Err(LlmError::MissingField("model")),
        };

        let registry = self.registry.unwrap_or_else(crate::registry::global);
        let service = ChatService::new(registry);
        service.configure(ProviderSelection::new(platform, model))?;
        Ok(ChatClient {
            service,
            defaults: self.defaults,
        })
    }
}

/// A configured client: a [`ChatService`] plus the builder's default options.
pub struct ChatClient {
    service: ChatService,
    defaults: ChatOptions,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl ChatClient {
    /// Send a single-shot message. Per-call `options` override the builder
    /// defaults field by field.
    pub async fn send(
        &self,
        prompt: &str,
        options: &ChatOptions,
    ) -> Result<ChatResponse, LlmError> {
        let merged = self.defaults.merge(options);
        self.service.send(prompt, &merged).await
    }

    /// Stream a message with the same defaults-merging behavior as `send`.
    pub async fn stream(
        &self,
        prompt: &str,
        options: &ChatOptions,
    ) -> Result<ChatStream, LlmError> {
        let merged = self.defaults.merge(options);
        self.service.stream(prompt, &merged).await
    }

    /// The selection this client was built with.
    pub fn selection(&self) -> ProviderSelection {
        self.service
            .current_selection()
            .expect("a built client is always configured")
    }

    /// The underlying service, for runtime re-configuration.
    pub fn service(&self) -> &ChatService {
        &self.service
    }
}
