//! Embedding generation for semantic search (spec 4.5): fixed dimension per
//! model, batched dispatch, per-item failure markers rather than aborting
//! the whole call.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// Options for one `embed_batch` call.
#[derive(Debug, Clone)]
pub struct EmbedOptions {
    pub model: Option<String>,
    pub batch_size: usize,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self { model: None, batch_size: 100 }
    }
}

/// Per-input outcome: a vector, or an opaque failure reason for that input.
#[derive(Debug, Clone)]
pub enum EmbedOutcome {
    Ok(Vec<f32>),
    Failed(String),
}

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate one outcome per input, in the same order, batching
    /// dispatches by `opts.batch_size`. A dispatch failure marks every input
    /// in that dispatch as failed without aborting the others.
    async fn embed_batch(&self, texts: &[String], opts: &EmbedOptions) -> Result<Vec<EmbedOutcome>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}
