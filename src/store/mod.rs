//! Persistence layer: an 11-table SQLite schema and one repository per entity.
//!
//! Every repository shares a single [`StoreContext`], itself a thin wrapper
//! around a `Mutex<rusqlite::Connection>`. Callers go through [`Store`], a
//! facade that exposes one field per repository plus a handful of
//! cross-repository helpers (e.g. atomically writing a memory together with
//! its chunks and embeddings).

mod chunks;
mod context;
mod deeplinks;
mod embeddings;
mod jobs;
mod memories;
mod models;
mod platform;
mod processed_content;
mod schema;
mod spaces;
mod tags;

pub use chunks::ChunkRepository;
pub use context::StoreContext;
pub use deeplinks::DeepLinkRepository;
pub use embeddings::EmbeddingRepository;
pub use jobs::JobRepository;
pub use memories::MemoryRepository;
pub use models::*;
pub use platform::{PlatformTranscriptRepository, PlatformVideoRepository};
pub use processed_content::ProcessedContentRepository;
pub use spaces::SpaceRepository;
pub use tags::{TagRepository};

use std::sync::Arc;

use crate::error::Result;

/// Facade bundling every repository behind a single shared connection.
#[derive(Clone)]
pub struct Store {
    ctx: Arc<StoreContext>,
    pub spaces: Arc<SpaceRepository>,
    pub memories: Arc<MemoryRepository>,
    pub chunks: Arc<ChunkRepository>,
    pub embeddings: Arc<EmbeddingRepository>,
    pub jobs: Arc<JobRepository>,
    pub processed_content: Arc<ProcessedContentRepository>,
    pub platform_videos: Arc<PlatformVideoRepository>,
    pub platform_transcripts: Arc<PlatformTranscriptRepository>,
    pub deeplinks: Arc<DeepLinkRepository>,
    pub tags: Arc<TagRepository>,
}

impl Store {
    pub fn open(db_path: &str) -> Result<Self> {
        let ctx = StoreContext::open(db_path)?;
        Ok(Self::from_context(ctx))
    }

    pub fn open_in_memory() -> Result<Self> {
        let ctx = StoreContext::open_in_memory()?;
        Ok(Self::from_context(ctx))
    }

    fn from_context(ctx: Arc<StoreContext>) -> Self {
        Self {
            spaces: Arc::new(SpaceRepository::new(ctx.clone())),
            memories: Arc::new(MemoryRepository::new(ctx.clone())),
            chunks: Arc::new(ChunkRepository::new(ctx.clone())),
            embeddings: Arc::new(EmbeddingRepository::new(ctx.clone())),
            jobs: Arc::new(JobRepository::new(ctx.clone())),
            processed_content: Arc::new(ProcessedContentRepository::new(ctx.clone())),
            platform_videos: Arc::new(PlatformVideoRepository::new(ctx.clone())),
            platform_transcripts: Arc::new(PlatformTranscriptRepository::new(ctx.clone())),
            deeplinks: Arc::new(DeepLinkRepository::new(ctx.clone())),
            tags: Arc::new(TagRepository::new(ctx.clone())),
            ctx,
        }
    }

    /// Write a memory, its chunks, and (optionally) their embeddings inside a
    /// single transaction, so a crash between steps can never leave chunks
    /// without a parent memory or embeddings without chunks.
    pub fn ingest_memory(
        &self,
        space_id: &str,
        new_memory: NewMemory,
        chunk_texts: Vec<(String, Option<i64>, Option<i64>)>,
        embeddings: Option<Vec<(usize, Vec<f32>, String)>>,
    ) -> Result<(Memory, Vec<Chunk>)> {
        let mut conn = self.ctx.conn();
        let tx = conn.unchecked_transaction()?;

        let now = StoreContext::now();
        let memory = Memory {
            id: StoreContext::new_id(),
            space_id: space_id.to_string(),
            content_type: new_memory.content_type,
            title: new_memory.title,
            content: new_memory.content,
            source: new_memory.source,
            file_path: new_memory.file_path,
            metadata: new_memory.metadata,
            created_at: now,
            updated_at: now,
        };
        tx.execute(
            "INSERT INTO memories (id, space_id, content_type, title, content, source, file_path, metadata, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                memory.id,
                memory.space_id,
                memory.content_type.as_str(),
                memory.title,
                memory.content,
                memory.source,
                memory.file_path,
                StoreContext::to_json(&memory.metadata)?,
                memory.created_at.to_rfc3339(),
                memory.updated_at.to_rfc3339(),
            ],
        )?;

        let mut chunks = Vec::with_capacity(chunk_texts.len());
        for (order, (text, start_ms, end_ms)) in chunk_texts.into_iter().enumerate() {
            let chunk = Chunk {
                id: StoreContext::new_id(),
                memory_id: memory.id.clone(),
                chunk_text: text,
                chunk_order: order as i64,
                start_offset_ms: start_ms,
                end_offset_ms: end_ms,
                metadata: serde_json::Value::Object(Default::default()),
                created_at: StoreContext::now(),
            };
            tx.execute(
                "INSERT INTO chunks (id, memory_id, chunk_text, chunk_order, start_offset_ms, end_offset_ms, metadata, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    chunk.id,
                    chunk.memory_id,
                    chunk.chunk_text,
                    chunk.chunk_order,
                    chunk.start_offset_ms,
                    chunk.end_offset_ms,
                    StoreContext::to_json(&chunk.metadata)?,
                    chunk.created_at.to_rfc3339(),
                ],
            )?;
            chunks.push(chunk);
        }

        if let Some(embeddings) = embeddings {
            for (chunk_index, vector, model) in embeddings {
                let chunk_id = &chunks[chunk_index].id;
                let embedding_id = StoreContext::new_id();
                tx.execute(
                    "INSERT INTO vector_embeddings (id, content_id, content_type, model, dimensions, vector, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    rusqlite::params![
                        embedding_id,
                        chunk_id,
                        EmbeddingContentType::Chunk.as_str(),
                        model,
                        vector.len() as i64,
                        embedding_to_bytes(&vector),
                        StoreContext::now().to_rfc3339(),
                    ],
                )?;
            }
        }

        tx.commit()?;
        Ok((memory, chunks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ingest_memory_is_atomic() {
        let store = Store::open_in_memory().unwrap();
        let space = store.spaces.default_space().unwrap();
        let (memory, chunks) = store
            .ingest_memory(
                &space.id,
                NewMemory {
                    space_id: Some(space.id.clone()),
                    content_type: ContentType::Video,
                    title: Some("talk".into()),
                    content: "full transcript text".into(),
                    source: "local".into(),
                    file_path: None,
                    metadata: json!({}),
                },
                vec![("full transcript".to_string(), Some(0), Some(5000))],
                Some(vec![(0, vec![0.1, 0.2], "test-model".to_string())]),
            )
            .unwrap();
        assert_eq!(chunks.len(), 1);
        let fetched_chunks = store.chunks.list_by_memory(&memory.id).unwrap();
        assert_eq!(fetched_chunks.len(), 1);
        let embedding = store
            .embeddings
            .get(&chunks[0].id, EmbeddingContentType::Chunk, "test-model")
            .unwrap();
        assert!(embedding.is_some());
    }
}
