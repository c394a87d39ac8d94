//! Shared domain types.
//!
//! These are plain value shapes with no behavior beyond construction and
//! merging: the unified request options, usage statistics, the unified
//! response, streaming chunks, and the active-provider selection.

mod chat;
mod config;
mod streaming;

pub use chat::{ChatOptions, ChatResponse, Usage};
pub use config::ProviderSelection;
pub use streaming::{ChatStream, StreamChunk};
