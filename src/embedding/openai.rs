//! OpenAI embeddings implementation.

use super::{EmbedOptions, EmbedOutcome, Embedder};
use crate::error::{Result, SpiralmemError};
use crate::openai::create_client;
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// OpenAI-based embedder.
pub struct OpenAIEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbedder {
    /// Create a new OpenAI embedder with default settings.
    pub fn new() -> Self {
        Self::with_config("text-embedding-3-small", 1536)
    }

    /// Create a new OpenAI embedder with custom model and dimensions.
    pub fn with_config(model: &str, dimensions: usize) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
            dimensions,
        }
    }
}

impl Default for OpenAIEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let outcomes = self.embed_batch(&[text.to_string()], &EmbedOptions::default()).await?;
        match outcomes.into_iter().next() {
            Some(EmbedOutcome::Ok(vector)) => Ok(vector),
            Some(EmbedOutcome::Failed(reason)) => Err(SpiralmemError::Embedding(reason)),
            None => Err(SpiralmemError::Embedding("empty embedding response".to_string())),
        }
    }

    #[instrument(skip(self, texts, opts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String], opts: &EmbedOptions) -> Result<Vec<EmbedOutcome>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("generating embeddings for {} texts", texts.len());

        let model = opts.model.as_deref().unwrap_or(&self.model);
        let batch_size = opts.batch_size.max(1);
        let mut outcomes = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(batch_size) {
            let input: Vec<String> = chunk.to_vec();

            let request = match CreateEmbeddingRequestArgs::default()
                .model(model)
                .input(EmbeddingInput::StringArray(input))
                .dimensions(self.dimensions as u32)
                .build()
            {
                Ok(request) => request,
                Err(e) => {
                    outcomes.extend(chunk.iter().map(|_| EmbedOutcome::Failed(format!("failed to build request: {e}"))));
                    continue;
                }
            };

            match self.client.embeddings().create(request).await {
                Ok(response) => {
                    let mut data: Vec<_> = response.data.into_iter().collect();
                    data.sort_by_key(|e| e.index);
                    outcomes.extend(data.into_iter().map(|d| EmbedOutcome::Ok(d.embedding)));
                }
                Err(e) => {
                    let reason = format!("embedding API error: {e}");
                    outcomes.extend(chunk.iter().map(|_| EmbedOutcome::Failed(reason.clone())));
                }
            }
        }

        debug!("generated {} embedding outcomes", outcomes.len());
        Ok(outcomes)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedder_creation() {
        let embedder = OpenAIEmbedder::new();
        assert_eq!(embedder.dimensions(), 1536);

        let embedder = OpenAIEmbedder::with_config("text-embedding-3-large", 3072);
        assert_eq!(embedder.dimensions(), 3072);
    }
}
