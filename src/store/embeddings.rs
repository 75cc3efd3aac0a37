//! Repository for `vector_embeddings`: dense vectors keyed by content id + model.

use std::sync::Arc;

use rusqlite::{params, OptionalExtension};

use crate::error::Result;

use super::context::StoreContext;
use super::models::{embedding_to_bytes, bytes_to_embedding, EmbeddingContentType, VectorEmbedding};

pub struct EmbeddingRepository {
    ctx: Arc<StoreContext>,
}

impl EmbeddingRepository {
    pub fn new(ctx: Arc<StoreContext>) -> Self {
        Self { ctx }
    }

    /// Upsert the embedding for `(content_id, content_type, model)`.
    pub fn upsert(
        &self,
        content_id: &str,
        content_type: EmbeddingContentType,
        model: &str,
        vector: &[f32],
    ) -> Result<VectorEmbedding> {
        let embedding = VectorEmbedding {
            id: StoreContext::new_id(),
            content_id: content_id.to_string(),
            content_type,
            model: model.to_string(),
            dimensions: vector.len(),
            vector: vector.to_vec(),
            created_at: StoreContext::now(),
        };
        let conn = self.ctx.conn();
        conn.execute(
            "INSERT INTO vector_embeddings (id, content_id, content_type, model, dimensions, vector, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(content_id, content_type, model) DO UPDATE SET
                vector = excluded.vector, dimensions = excluded.dimensions, created_at = excluded.created_at",
            params![
                embedding.id,
                embedding.content_id,
                embedding.content_type.as_str(),
                embedding.model,
                embedding.dimensions as i64,
                embedding_to_bytes(&embedding.vector),
                embedding.created_at.to_rfc3339(),
            ],
        )?;
        Ok(embedding)
    }

    pub fn get(
        &self,
        content_id: &str,
        content_type: EmbeddingContentType,
        model: &str,
    ) -> Result<Option<VectorEmbedding>> {
        let conn = self.ctx.conn();
        conn.query_row(
            "SELECT id, content_id, content_type, model, dimensions, vector, created_at
             FROM vector_embeddings WHERE content_id = ?1 AND content_type = ?2 AND model = ?3",
            params![content_id, content_type.as_str(), model],
            row_to_embedding,
        )
        .optional()
        .map_err(Into::into)
    }

    /// All embeddings for a given model, for a brute-force vector scan.
    pub fn list_by_model(&self, content_type: EmbeddingContentType, model: &str) -> Result<Vec<VectorEmbedding>> {
        let conn = self.ctx.conn();
        let mut stmt = conn.prepare(
            "SELECT id, content_id, content_type, model, dimensions, vector, created_at
             FROM vector_embeddings WHERE content_type = ?1 AND model = ?2",
        )?;
        let rows = stmt.query_map(params![content_type.as_str(), model], row_to_embedding)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn count(&self) -> Result<i64> {
        let conn = self.ctx.conn();
        conn.query_row("SELECT COUNT(*) FROM vector_embeddings", [], |r| r.get(0))
            .map_err(Into::into)
    }

    pub fn count_by_model(&self) -> Result<Vec<(String, i64)>> {
        let conn = self.ctx.conn();
        let mut stmt =
            conn.prepare("SELECT model, COUNT(*) FROM vector_embeddings GROUP BY model ORDER BY model")?;
        let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn row_to_embedding(row: &rusqlite::Row<'_>) -> rusqlite::Result<VectorEmbedding> {
    let content_type_raw: String = row.get(2)?;
    let dims: i64 = row.get(4)?;
    let vector_bytes: Vec<u8> = row.get(5)?;
    let created_raw: String = row.get(6)?;
    Ok(VectorEmbedding {
        id: row.get(0)?,
        content_id: row.get(1)?,
        content_type: content_type_raw
            .parse::<EmbeddingContentType>()
            .unwrap_or(EmbeddingContentType::Chunk),
        model: row.get(3)?,
        dimensions: dims as usize,
        vector: bytes_to_embedding(&vector_bytes),
        created_at: chrono::DateTime::parse_from_rfc3339(&created_raw)
            .map(|d| d.with_timezone(&chrono::Utc))
            .unwrap_or_else(|_| chrono::Utc::now()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_then_get() {
        let ctx = StoreContext::open_in_memory().unwrap();
        let repo = EmbeddingRepository::new(ctx);
        repo.upsert("chunk-1", EmbeddingContentType::Chunk, "test-model", &[1.0, 2.0, 3.0])
            .unwrap();
        let fetched = repo
            .get("chunk-1", EmbeddingContentType::Chunk, "test-model")
            .unwrap()
            .unwrap();
        assert_eq!(fetched.vector, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_upsert_overwrites_existing() {
        let ctx = StoreContext::open_in_memory().unwrap();
        let repo = EmbeddingRepository::new(ctx);
        repo.upsert("chunk-1", EmbeddingContentType::Chunk, "test-model", &[1.0])
            .unwrap();
        repo.upsert("chunk-1", EmbeddingContentType::Chunk, "test-model", &[2.0])
            .unwrap();
        let all = repo.list_by_model(EmbeddingContentType::Chunk, "test-model").unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].vector, vec![2.0]);
    }
}
