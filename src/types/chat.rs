//! Chat request options and the unified response shape.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Options for a chat request.
///
/// All fields are optional; unset fields are left to the backend's defaults.
/// Options are immutable values — combining two sets (builder defaults and
/// per-call overrides) produces a new value via [`ChatOptions::merge`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChatOptions {
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum number of tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// System prompt prepended to the conversation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Advisory streaming hint. Carried through but not acted on by the core.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streaming: Option<bool>,
    /// Backend-specific passthrough values, forwarded opaquely to the adapter.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ChatOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the system prompt.
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// Set the advisory streaming hint.
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = Some(streaming);
        self
    }

    /// Add a backend-specific metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Merge `overrides` over `self`, field by field.
    ///
    /// Set fields in `overrides` win; unset fields fall back to `self`.
    /// Metadata maps are unioned per key with the override side winning.
    pub fn merge(&self, overrides: &ChatOptions) -> ChatOptions {
        let mut metadata = self.metadata.clone();
        for (k, v) in &overrides.metadata {
            metadata.insert(k.clone(), v.clone());
        }
        ChatOptions {
            temperature: overrides.temperature.or(self.temperature),
            max_tokens: overrides.max_tokens.or(self.max_tokens),
            system_prompt: overrides
                .system_prompt
                .clone()
                .or_else(|| self.system_prompt.clone()),
            streaming: overrides.streaming.or(self.streaming),
            metadata,
        }
    }
}

/// Token usage statistics for a single response.
///
/// Invariant: `total_tokens == prompt_tokens + completion_tokens` for every
/// adapter-produced response.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    /// Input tokens consumed by the prompt.
    pub prompt_tokens: u32,
    /// Output tokens generated.
    pub completion_tokens: u32,
    /// Total tokens used.
    pub total_tokens: u32,
}

impl Usage {
    /// Create usage statistics, computing the total.
    pub const fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Unified chat response.
///
/// Produced fresh per call by an adapter and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    /// Model that produced the response, as reported by the backend.
    pub model: String,
    /// The generated text.
    pub content: String,
    /// Token usage statistics.
    pub usage: Usage,
    /// Backend-specific extras the unified shape has no field for.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub additional_data: HashMap<String, serde_json::Value>,
}
