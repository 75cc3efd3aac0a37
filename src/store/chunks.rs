//! Repository for `chunks`: retrieval-sized pieces of a memory.

use std::sync::Arc;

use rusqlite::params;

use crate::error::Result;

use super::context::StoreContext;
use super::models::Chunk;

pub struct ChunkRepository {
    ctx: Arc<StoreContext>,
}

impl ChunkRepository {
    pub fn new(ctx: Arc<StoreContext>) -> Self {
        Self { ctx }
    }

    /// Insert a batch of chunks for a memory inside one transaction.
    pub fn create_batch(
        &self,
        memory_id: &str,
        texts: &[(String, Option<i64>, Option<i64>)],
    ) -> Result<Vec<Chunk>> {
        let mut conn = self.ctx.conn();
        let tx = conn.unchecked_transaction()?;
        let mut chunks = Vec::with_capacity(texts.len());
        for (order, (text, start_ms, end_ms)) in texts.iter().enumerate() {
            let chunk = Chunk {
                id: StoreContext::new_id(),
                memory_id: memory_id.to_string(),
                chunk_text: text.clone(),
                chunk_order: order as i64,
                start_offset_ms: *start_ms,
                end_offset_ms: *end_ms,
                metadata: serde_json::Value::Object(Default::default()),
                created_at: StoreContext::now(),
            };
            tx.execute(
                "INSERT INTO chunks (id, memory_id, chunk_text, chunk_order, start_offset_ms, end_offset_ms, metadata, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
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
        tx.commit()?;
        Ok(chunks)
    }

    pub fn list_by_memory(&self, memory_id: &str) -> Result<Vec<Chunk>> {
        let conn = self.ctx.conn();
        let mut stmt = conn.prepare(
            "SELECT id, memory_id, chunk_text, chunk_order, start_offset_ms, end_offset_ms, metadata, created_at
             FROM chunks WHERE memory_id = ?1 ORDER BY chunk_order ASC",
        )?;
        let rows = stmt.query_map(params![memory_id], row_to_chunk)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn get(&self, id: &str) -> Result<Option<Chunk>> {
        let conn = self.ctx.conn();
        conn.query_row(
            "SELECT id, memory_id, chunk_text, chunk_order, start_offset_ms, end_offset_ms, metadata, created_at
             FROM chunks WHERE id = ?1",
            params![id],
            row_to_chunk,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Rough keyword search: case-insensitive substring match, scored by occurrence count.
    pub fn search_keyword(&self, query: &str, limit: usize) -> Result<Vec<(Chunk, f32)>> {
        let conn = self.ctx.conn();
        let mut stmt = conn.prepare(
            "SELECT id, memory_id, chunk_text, chunk_order, start_offset_ms, end_offset_ms, metadata, created_at
             FROM chunks WHERE chunk_text LIKE ?1 COLLATE NOCASE",
        )?;
        let pattern = format!("%{}%", query.replace('%', "\\%"));
        let rows = stmt.query_map(params![pattern], row_to_chunk)?;
        let needle = query.to_lowercase();
        let mut scored: Vec<(Chunk, f32)> = rows
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .map(|c| {
                let hay = c.chunk_text.to_lowercase();
                let occurrences = hay.matches(&needle).count() as f32;
                (c, occurrences)
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }
}

use rusqlite::OptionalExtension;

fn row_to_chunk(row: &rusqlite::Row<'_>) -> rusqlite::Result<Chunk> {
    let metadata_raw: String = row.get(6)?;
    let created_raw: String = row.get(7)?;
    Ok(Chunk {
        id: row.get(0)?,
        memory_id: row.get(1)?,
        chunk_text: row.get(2)?,
        chunk_order: row.get(3)?,
        start_offset_ms: row.get(4)?,
        end_offset_ms: row.get(5)?,
        metadata: serde_json::from_str(&metadata_raw).unwrap_or(serde_json::Value::Null),
        created_at: chrono::DateTime::parse_from_rfc3339(&created_raw)
            .map(|d| d.with_timezone(&chrono::Utc))
            .unwrap_or_else(|_| chrono::Utc::now()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_batch_preserves_order() {
        let ctx = StoreContext::open_in_memory().unwrap();
        let repo = ChunkRepository::new(ctx);
        let texts = vec![
            ("first".to_string(), Some(0), Some(1000)),
            ("second".to_string(), Some(1000), Some(2000)),
        ];
        let chunks = repo.create_batch("mem-1", &texts).unwrap();
        assert_eq!(chunks[0].chunk_order, 0);
        assert_eq!(chunks[1].chunk_order, 1);
        let listed = repo.list_by_memory("mem-1").unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[test]
    fn test_search_keyword_ranks_by_occurrence() {
        let ctx = StoreContext::open_in_memory().unwrap();
        let repo = ChunkRepository::new(ctx);
        repo.create_batch(
            "mem-1",
            &[
                ("rust rust rust".to_string(), None, None),
                ("rust is nice".to_string(), None, None),
            ],
        )
        .unwrap();
        let results = repo.search_keyword("rust", 10).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].1 >= results[1].1);
    }
}
