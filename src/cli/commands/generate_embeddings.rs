//! `generate-embeddings` command: batch-embed chunks that don't yet have an
//! embedding for the configured model.

use anyhow::Result;

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::{EmbedOptions, EmbedOutcome};
use crate::store::EmbeddingContentType;

use super::context;

pub async fn run_generate_embeddings(
    memory_ids: Option<Vec<String>>,
    force: bool,
    batch_size: Option<usize>,
    settings: Settings,
) -> Result<()> {
    preflight::check(Operation::SemanticSearch, &settings)?;

    let store = context::open_store(&settings)?;
    let embedder = context::build_embedder(&settings)
        .ok_or_else(|| anyhow::anyhow!("no embedder configured (set OPENAI_API_KEY)"))?;
    let model = settings.embedding.model.clone();

    let memories = match memory_ids {
        Some(ids) => {
            let fetched: Vec<Option<_>> = ids.iter().map(|id| store.memories.get(id)).collect::<Result<_, _>>()?;
            fetched.into_iter().flatten().collect()
        }
        None => store.memories.list_for_search(None, None)?,
    };

    let mut pending_ids = Vec::new();
    let mut pending_texts = Vec::new();

    for memory in &memories {
        for chunk in store.chunks.list_by_memory(&memory.id)? {
            if !force && store.embeddings.get(&chunk.id, EmbeddingContentType::Chunk, &model)?.is_some() {
                continue;
            }
            pending_ids.push(chunk.id.clone());
            pending_texts.push(chunk.chunk_text.clone());
        }
    }

    if pending_ids.is_empty() {
        Output::info("All chunks already have embeddings for this model.");
        return Ok(());
    }

    Output::info(&format!("Embedding {} chunk(s) with model {model}...", pending_ids.len()));
    let opts = EmbedOptions { model: Some(model.clone()), batch_size: batch_size.unwrap_or(100) };
    let outcomes = embedder.embed_batch(&pending_texts, &opts).await?;

    let mut embedded = 0usize;
    let mut failed = 0usize;
    for (id, outcome) in pending_ids.iter().zip(outcomes.into_iter()) {
        match outcome {
            EmbedOutcome::Ok(vector) => {
                store.embeddings.upsert(id, EmbeddingContentType::Chunk, &model, &vector)?;
                embedded += 1;
            }
            EmbedOutcome::Failed(reason) => {
                Output::warning(&format!("Embedding failed for chunk {id}: {reason}"));
                failed += 1;
            }
        }
    }

    Output::success(&format!("{embedded} embedded, {failed} failed"));
    Ok(())
}
