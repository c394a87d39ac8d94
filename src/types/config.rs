//! Active-provider selection.

use serde::{Deserialize, Serialize};

/// Identifies the currently active backend selection of a [`ChatService`].
///
/// `platform` is a key into the [`ProviderRegistry`]; `model` is a key into
/// the resolved factory's supported-model allowlist. Replacing a selection is
/// a full re-resolution through the registry, not an incremental update.
///
/// [`ChatService`]: crate::service::ChatService
/// [`ProviderRegistry`]: crate::registry::ProviderRegistry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderSelection {
    /// Registered platform name (matched case-insensitively).
    pub platform: String,
    /// Model id within the platform's allowlist (matched exactly).
    pub model: String,
}

impl ProviderSelection {
    /// Create a selection.
    pub fn new(platform: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            model: model.into(),
        }
    }
}
