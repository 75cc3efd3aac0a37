//! Repositories for `tags` and the `memory_tags` join table.

use std::sync::Arc;

use rusqlite::{params, OptionalExtension};

use crate::error::Result;

use super::context::StoreContext;
use super::models::Tag;

pub struct TagRepository {
    ctx: Arc<StoreContext>,
}

impl TagRepository {
    pub fn new(ctx: Arc<StoreContext>) -> Self {
        Self { ctx }
    }

    /// Get or create a tag by name, case-insensitively.
    pub fn get_or_create(&self, name: &str) -> Result<Tag> {
        let normalized = name.trim().to_lowercase();
        let conn = self.ctx.conn();
        if let Some(tag) = conn
            .query_row(
                "SELECT id, name, created_at FROM tags WHERE name = ?1",
                params![normalized],
                row_to_tag,
            )
            .optional()?
        {
            return Ok(tag);
        }
        let tag = Tag {
            id: StoreContext::new_id(),
            name: normalized,
            created_at: StoreContext::now(),
        };
        conn.execute(
            "INSERT INTO tags (id, name, created_at) VALUES (?1, ?2, ?3)",
            params![tag.id, tag.name, tag.created_at.to_rfc3339()],
        )?;
        Ok(tag)
    }

    pub fn attach(&self, memory_id: &str, tag_id: &str) -> Result<()> {
        let conn = self.ctx.conn();
        conn.execute(
            "INSERT OR IGNORE INTO memory_tags (memory_id, tag_id) VALUES (?1, ?2)",
            params![memory_id, tag_id],
        )?;
        Ok(())
    }

    pub fn list_for_memory(&self, memory_id: &str) -> Result<Vec<Tag>> {
        let conn = self.ctx.conn();
        let mut stmt = conn.prepare(
            "SELECT t.id, t.name, t.created_at FROM tags t
             JOIN memory_tags mt ON mt.tag_id = t.id
             WHERE mt.memory_id = ?1 ORDER BY t.name ASC",
        )?;
        let rows = stmt.query_map(params![memory_id], row_to_tag)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn row_to_tag(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tag> {
    let created_raw: String = row.get(2)?;
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: chrono::DateTime::parse_from_rfc3339(&created_raw)
            .map(|d| d.with_timezone(&chrono::Utc))
            .unwrap_or_else(|_| chrono::Utc::now()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_is_case_insensitive() {
        let ctx = StoreContext::open_in_memory().unwrap();
        let repo = TagRepository::new(ctx);
        let a = repo.get_or_create("Rust").unwrap();
        let b = repo.get_or_create("rust").unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_attach_and_list_for_memory() {
        let ctx = StoreContext::open_in_memory().unwrap();
        let repo = TagRepository::new(ctx);
        let tag = repo.get_or_create("video").unwrap();
        repo.attach("mem-1", &tag.id).unwrap();
        let listed = repo.list_for_memory("mem-1").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "video");
    }
}
