//! Repository for `memories`: the logical unit of ingested content.

use std::sync::Arc;

use rusqlite::{params, OptionalExtension};

use crate::error::Result;

use super::context::{require_row, StoreContext};
use super::models::{ContentType, Memory, NewMemory};

pub struct MemoryRepository {
    ctx: Arc<StoreContext>,
}

impl MemoryRepository {
    pub fn new(ctx: Arc<StoreContext>) -> Self {
        Self { ctx }
    }

    pub fn create(&self, space_id: &str, new: NewMemory) -> Result<Memory> {
        let now = StoreContext::now();
        let memory = Memory {
            id: StoreContext::new_id(),
            space_id: space_id.to_string(),
            content_type: new.content_type,
            title: new.title,
            content: new.content,
            source: new.source,
            file_path: new.file_path,
            metadata: new.metadata,
            created_at: now,
            updated_at: now,
        };
        let conn = self.ctx.conn();
        conn.execute(
            "INSERT INTO memories (id, space_id, content_type, title, content, source, file_path, metadata, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
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
        Ok(memory)
    }

    pub fn get(&self, id: &str) -> Result<Option<Memory>> {
        let conn = self.ctx.conn();
        conn.query_row(
            "SELECT id, space_id, content_type, title, content, source, file_path, metadata, created_at, updated_at
             FROM memories WHERE id = ?1",
            params![id],
            row_to_memory,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn list_by_space(&self, space_id: &str, limit: usize, offset: usize) -> Result<Vec<Memory>> {
        let conn = self.ctx.conn();
        let mut stmt = conn.prepare(
            "SELECT id, space_id, content_type, title, content, source, file_path, metadata, created_at, updated_at
             FROM memories WHERE space_id = ?1 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt.query_map(params![space_id, limit as i64, offset as i64], row_to_memory)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let conn = self.ctx.conn();
        let affected = conn.execute("DELETE FROM memories WHERE id = ?1", params![id])?;
        require_row(affected, &format!("memory '{id}'"))
    }

    /// Candidate set for keyword search: every memory matching the optional
    /// space/content-type filters. Token scoring happens in the `search`
    /// module rather than in SQL.
    pub fn list_for_search(&self, space_id: Option<&str>, content_types: Option<&[ContentType]>) -> Result<Vec<Memory>> {
        let conn = self.ctx.conn();
        let space_id_owned = space_id.map(str::to_string);
        let type_strings: Vec<String> = content_types.unwrap_or(&[]).iter().map(|t| t.as_str().to_string()).collect();

        let mut sql = "SELECT id, space_id, content_type, title, content, source, file_path, metadata, created_at, updated_at
             FROM memories WHERE 1=1"
            .to_string();
        let mut params_vec: Vec<&dyn rusqlite::ToSql> = Vec::new();
        if let Some(space_id) = &space_id_owned {
            sql.push_str(&format!(" AND space_id = ?{}", params_vec.len() + 1));
            params_vec.push(space_id);
        }
        if !type_strings.is_empty() {
            let start = params_vec.len() + 1;
            let placeholders: Vec<String> = (0..type_strings.len()).map(|i| format!("?{}", start + i)).collect();
            sql.push_str(&format!(" AND content_type IN ({})", placeholders.join(",")));
            for t in &type_strings {
                params_vec.push(t);
            }
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_vec.as_slice(), row_to_memory)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn count_by_space(&self, space_id: &str) -> Result<i64> {
        let conn = self.ctx.conn();
        conn.query_row(
            "SELECT COUNT(*) FROM memories WHERE space_id = ?1",
            params![space_id],
            |r| r.get(0),
        )
        .map_err(Into::into)
    }
}

fn row_to_memory(row: &rusqlite::Row<'_>) -> rusqlite::Result<Memory> {
    let content_type_raw: String = row.get(2)?;
    let metadata_raw: String = row.get(7)?;
    let created_raw: String = row.get(8)?;
    let updated_raw: String = row.get(9)?;
    Ok(Memory {
        id: row.get(0)?,
        space_id: row.get(1)?,
        content_type: content_type_raw.parse::<ContentType>().unwrap_or(ContentType::Text),
        title: row.get(3)?,
        content: row.get(4)?,
        source: row.get(5)?,
        file_path: row.get(6)?,
        metadata: serde_json::from_str(&metadata_raw).unwrap_or(serde_json::Value::Null),
        created_at: parse_dt(&created_raw),
        updated_at: parse_dt(&updated_raw),
    })
}

fn parse_dt(raw: &str) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&chrono::Utc))
        .unwrap_or_else(|_| chrono::Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::spaces::SpaceRepository;
    use serde_json::json;

    #[test]
    fn test_create_and_get_memory() {
        let ctx = StoreContext::open_in_memory().unwrap();
        let space = SpaceRepository::new(ctx.clone()).default_space().unwrap();
        let repo = MemoryRepository::new(ctx);
        let memory = repo
            .create(
                &space.id,
                NewMemory {
                    space_id: Some(space.id.clone()),
                    content_type: ContentType::Video,
                    title: Some("demo".into()),
                    content: "hello world".into(),
                    source: "local".into(),
                    file_path: None,
                    metadata: json!({}),
                },
            )
            .unwrap();
        let fetched = repo.get(&memory.id).unwrap().unwrap();
        assert_eq!(fetched.content, "hello world");
    }

    #[test]
    fn test_delete_missing_memory_errors() {
        let ctx = StoreContext::open_in_memory().unwrap();
        let repo = MemoryRepository::new(ctx);
        let err = repo.delete("missing").unwrap_err();
        assert!(matches!(err, crate::error::SpiralmemError::NotFound(_)));
    }

    #[test]
    fn test_delete_memory_cascades_to_chunks() {
        let ctx = StoreContext::open_in_memory().unwrap();
        let space = SpaceRepository::new(ctx.clone()).default_space().unwrap();
        let repo = MemoryRepository::new(ctx.clone());
        let memory = repo
            .create(
                &space.id,
                NewMemory {
                    space_id: Some(space.id.clone()),
                    content_type: ContentType::Video,
                    title: Some("demo".into()),
                    content: "hello world".into(),
                    source: "local".into(),
                    file_path: None,
                    metadata: json!({}),
                },
            )
            .unwrap();

        let chunk_repo = crate::store::ChunkRepository::new(ctx);
        chunk_repo.create_batch(&memory.id, &[("hello".to_string(), Some(0), Some(1000))]).unwrap();
        assert_eq!(chunk_repo.list_by_memory(&memory.id).unwrap().len(), 1);

        repo.delete(&memory.id).unwrap();
        assert!(chunk_repo.list_by_memory(&memory.id).unwrap().is_empty());
    }
}
