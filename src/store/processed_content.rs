//! Repository for `processed_video_content`: the output of a completed job.

use std::sync::Arc;

use rusqlite::{params, OptionalExtension};
use serde_json::Value as Json;

use crate::error::Result;

use super::context::StoreContext;
use super::models::{Chunk, ProcessedVideoContent, TranscriptSnapshot, VectorEmbedding};

pub struct ProcessedContentRepository {
    ctx: Arc<StoreContext>,
}

impl ProcessedContentRepository {
    pub fn new(ctx: Arc<StoreContext>) -> Self {
        Self { ctx }
    }

    pub fn create(
        &self,
        job_id: &str,
        memory_id: &str,
        chunks: Vec<Chunk>,
        embeddings: Option<Vec<VectorEmbedding>>,
        transcript: Option<TranscriptSnapshot>,
        frames: Option<Json>,
        thumbnails: Option<Json>,
    ) -> Result<ProcessedVideoContent> {
        let content = ProcessedVideoContent {
            id: StoreContext::new_id(),
            job_id: job_id.to_string(),
            memory_id: memory_id.to_string(),
            chunks,
            embeddings,
            transcript,
            frames,
            thumbnails,
            metadata: Json::Object(Default::default()),
            created_at: StoreContext::now(),
        };
        let conn = self.ctx.conn();
        conn.execute(
            "INSERT INTO processed_video_content
                (id, job_id, memory_id, chunks, embeddings, transcript, frames, thumbnails, metadata, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                content.id,
                content.job_id,
                content.memory_id,
                StoreContext::to_json(&content.chunks)?,
                content.embeddings.as_ref().map(StoreContext::to_json).transpose()?,
                content.transcript.as_ref().map(StoreContext::to_json).transpose()?,
                content.frames.as_ref().map(|j| j.to_string()),
                content.thumbnails.as_ref().map(|j| j.to_string()),
                StoreContext::to_json(&content.metadata)?,
                content.created_at.to_rfc3339(),
            ],
        )?;
        Ok(content)
    }

    pub fn get_by_job(&self, job_id: &str) -> Result<Option<ProcessedVideoContent>> {
        let conn = self.ctx.conn();
        conn.query_row(
            "SELECT id, job_id, memory_id, chunks, embeddings, transcript, frames, thumbnails, metadata, created_at
             FROM processed_video_content WHERE job_id = ?1",
            params![job_id],
            row_to_content,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn get_by_memory(&self, memory_id: &str) -> Result<Option<ProcessedVideoContent>> {
        let conn = self.ctx.conn();
        conn.query_row(
            "SELECT id, job_id, memory_id, chunks, embeddings, transcript, frames, thumbnails, metadata, created_at
             FROM processed_video_content WHERE memory_id = ?1",
            params![memory_id],
            row_to_content,
        )
        .optional()
        .map_err(Into::into)
    }
}

fn row_to_content(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProcessedVideoContent> {
    let chunks_raw: String = row.get(3)?;
    let embeddings_raw: Option<String> = row.get(4)?;
    let transcript_raw: Option<String> = row.get(5)?;
    let frames_raw: Option<String> = row.get(6)?;
    let thumbnails_raw: Option<String> = row.get(7)?;
    let metadata_raw: String = row.get(8)?;
    let created_raw: String = row.get(9)?;
    Ok(ProcessedVideoContent {
        id: row.get(0)?,
        job_id: row.get(1)?,
        memory_id: row.get(2)?,
        chunks: serde_json::from_str(&chunks_raw).unwrap_or_default(),
        embeddings: embeddings_raw.and_then(|s| serde_json::from_str(&s).ok()),
        transcript: transcript_raw.and_then(|s| serde_json::from_str(&s).ok()),
        frames: frames_raw.and_then(|s| serde_json::from_str(&s).ok()),
        thumbnails: thumbnails_raw.and_then(|s| serde_json::from_str(&s).ok()),
        metadata: serde_json::from_str(&metadata_raw).unwrap_or(Json::Null),
        created_at: chrono::DateTime::parse_from_rfc3339(&created_raw)
            .map(|d| d.with_timezone(&chrono::Utc))
            .unwrap_or_else(|_| chrono::Utc::now()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_get_by_job() {
        let ctx = StoreContext::open_in_memory().unwrap();
        let repo = ProcessedContentRepository::new(ctx);
        repo.create("job-1", "mem-1", vec![], None, None, None, None).unwrap();
        let fetched = repo.get_by_job("job-1").unwrap().unwrap();
        assert_eq!(fetched.memory_id, "mem-1");
    }
}
