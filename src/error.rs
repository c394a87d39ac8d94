//! Error types for omnichat.
//!
//! Every failure mode of the core is a variant of [`LlmError`]. The first four
//! variants are fail-fast validation errors raised at the violated
//! precondition; [`LlmError::BackendError`] is the opaque passthrough for
//! whatever the backend raised (network, auth, rate limit, context window —
//! the core does not classify these further).

use thiserror::Error;

/// Errors produced by the omnichat core.
#[derive(Error, Debug)]
pub enum LlmError {
    /// No factory registered under the requested platform name.
    #[error("No provider registered for platform '{platform}'")]
    NotRegistered {
        /// The platform name that was looked up.
        platform: String,
    },

    /// The model id is not in the platform's supported-model allowlist.
    #[error("Platform '{platform}' does not support model '{model}'")]
    UnsupportedModel {
        /// The platform whose factory rejected the model.
        platform: String,
        /// The rejected model id.
        model: String,
    },

    /// `send`/`stream` called on a service that was never configured.
    #[error("Chat service is not configured; call configure() first")]
    NotConfigured,

    /// Builder `build()` called with a required field unset or empty.
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    /// Opaque backend failure, propagated unmodified from the backend boundary.
    #[error("Backend error: {0}")]
    BackendError(String),

    /// Wire (de)serialization failure.
    #[error("JSON error: {0}")]
    JsonError(String),
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}
