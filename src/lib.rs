//! # omnichat
//!
//! A pluggable provider-abstraction layer for large-language-model backends:
//! one uniform request/response contract over heterogeneous providers,
//! runtime backend switching by name, and the same consumption shapes for
//! single-shot and streamed responses.
//!
//! The built-in backends (Bedrock, Azure OpenAI, Google, Ollama) ship with
//! deterministic mock clients behind per-backend client traits; a real
//! deployment swaps genuine network clients in behind the same traits with
//! no change to any code upstream of the adapters.
//!
//! ```rust,no_run
//! use omnichat::prelude::*;
//! use futures_util::StreamExt;
//!
//! # async fn example() -> Result<(), LlmError> {
//! let client = ChatClientBuilder::new()
//!     .platform("ollama")
//!     .model("llama3")
//!     .default_options(ChatOptions::new().with_temperature(0.7))
//!     .build()?;
//!
//! let response = client.send("Hello!", &ChatOptions::new()).await?;
//! println!("{} said: {}", response.model, response.content);
//!
//! let mut stream = client.stream("Hello again!", &ChatOptions::new()).await?;
//! while let Some(chunk) = stream.next().await {
//!     print!("{}", chunk?.content);
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod error;
pub mod providers;
pub mod registry;
pub mod service;
pub mod traits;
pub mod types;

/// Common imports for working with omnichat.
pub mod prelude {
    pub use crate::builder::{ChatClient, ChatClientBuilder};
    pub use crate::error::LlmError;
    pub use crate::registry::ProviderRegistry;
    pub use crate::service::ChatService;
    pub use crate::traits::{ChatStrategy, ProviderFactory};
    pub use crate::types::{
        ChatOptions, ChatResponse, ChatStream, ProviderSelection, StreamChunk, Usage,
    };
}

pub use builder::{ChatClient, ChatClientBuilder};
pub use error::LlmError;
pub use registry::ProviderRegistry;
pub use service::ChatService;
pub use traits::{ChatStrategy, ProviderFactory};
pub use types::{ChatOptions, ChatResponse, ChatStream, ProviderSelection, StreamChunk, Usage};
