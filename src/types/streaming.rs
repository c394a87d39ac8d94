//! Core streaming types.

use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::error::LlmError;

/// One fragment of an incrementally delivered response.
///
/// A produced sequence is finite, delivered strictly in generation order, and
/// contains exactly one chunk with `is_last == true`, positioned last.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamChunk {
    /// Model that produced the fragment.
    pub model: String,
    /// The content fragment. May be empty.
    pub content: String,
    /// Whether this is the final chunk of the sequence.
    pub is_last: bool,
}

impl StreamChunk {
    /// Create a non-terminal chunk.
    pub fn new(model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            content: content.into(),
            is_last: false,
        }
    }

    /// Create the terminal chunk of a sequence.
    pub fn last(model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            content: content.into(),
            is_last: true,
        }
    }
}

/// Pinned, boxed stream of chunks — the uniform streaming shape every
/// adapter returns, whether the backend streams natively or the adapter
/// synthesizes the sequence from a complete response.
pub type ChatStream = Pin<Box<dyn ChunkStream>>;

/// Object-safe alias for the chunk stream bound. Exists so the boxed trait
/// object behind [`ChatStream`] can carry a `Debug` impl, which the orphan
/// rule forbids for a bare `dyn Stream + Send`.
pub trait ChunkStream: Stream<Item = Result<StreamChunk, LlmError>> + Send {}

impl<S> ChunkStream for S where S: Stream<Item = Result<StreamChunk, LlmError>> + Send + ?Sized {}

impl std::fmt::Debug for dyn ChunkStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatStream").finish_non_exhaustive()
    }
}
