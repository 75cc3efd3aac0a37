//! Repository for `spaces`: named partitions that memories belong to.

use std::sync::Arc;

use rusqlite::{params, OptionalExtension};
use serde_json::Value as Json;

use crate::error::{Result, SpiralmemError};

use super::context::StoreContext;
use super::models::Space;

pub struct SpaceRepository {
    ctx: Arc<StoreContext>,
}

impl SpaceRepository {
    pub fn new(ctx: Arc<StoreContext>) -> Self {
        Self { ctx }
    }

    /// Create a space, failing with `AlreadyExists` if `name` is taken.
    pub fn create(&self, name: &str, description: Option<&str>) -> Result<Space> {
        let conn = self.ctx.conn();
        let existing: Option<String> = conn
            .query_row("SELECT id FROM spaces WHERE name = ?1", params![name], |r| r.get(0))
            .optional()?;
        if existing.is_some() {
            return Err(SpiralmemError::AlreadyExists(format!("space '{name}'")));
        }
        let space = Space {
            id: StoreContext::new_id(),
            name: name.to_string(),
            description: description.map(|s| s.to_string()),
            settings: Json::Object(Default::default()),
            created_at: StoreContext::now(),
        };
        conn.execute(
            "INSERT INTO spaces (id, name, description, settings, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                space.id,
                space.name,
                space.description,
                StoreContext::to_json(&space.settings)?,
                space.created_at.to_rfc3339(),
            ],
        )?;
        Ok(space)
    }

    pub fn get(&self, id: &str) -> Result<Option<Space>> {
        let conn = self.ctx.conn();
        conn.query_row(
            "SELECT id, name, description, settings, created_at FROM spaces WHERE id = ?1",
            params![id],
            row_to_space,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn get_by_name(&self, name: &str) -> Result<Option<Space>> {
        let conn = self.ctx.conn();
        conn.query_row(
            "SELECT id, name, description, settings, created_at FROM spaces WHERE name = ?1",
            params![name],
            row_to_space,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn list(&self) -> Result<Vec<Space>> {
        let conn = self.ctx.conn();
        let mut stmt = conn.prepare(
            "SELECT id, name, description, settings, created_at FROM spaces ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map([], row_to_space)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    /// The implicit default space, created on first use.
    pub fn default_space(&self) -> Result<Space> {
        if let Some(space) = self.get_by_name("default")? {
            return Ok(space);
        }
        self.create("default", Some("Default space"))
    }
}

fn row_to_space(row: &rusqlite::Row<'_>) -> rusqlite::Result<Space> {
    let settings_raw: String = row.get(3)?;
    let created_raw: String = row.get(4)?;
    Ok(Space {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        settings: serde_json::from_str(&settings_raw).unwrap_or(Json::Null),
        created_at: chrono::DateTime::parse_from_rfc3339(&created_raw)
            .map(|d| d.with_timezone(&chrono::Utc))
            .unwrap_or_else(|_| chrono::Utc::now()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_get_space() {
        let ctx = StoreContext::open_in_memory().unwrap();
        let repo = SpaceRepository::new(ctx);
        let space = repo.create("research", None).unwrap();
        let fetched = repo.get(&space.id).unwrap().unwrap();
        assert_eq!(fetched.name, "research");
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let ctx = StoreContext::open_in_memory().unwrap();
        let repo = SpaceRepository::new(ctx);
        repo.create("dup", None).unwrap();
        let err = repo.create("dup", None).unwrap_err();
        assert!(matches!(err, SpiralmemError::AlreadyExists(_)));
    }

    #[test]
    fn test_default_space_is_idempotent() {
        let ctx = StoreContext::open_in_memory().unwrap();
        let repo = SpaceRepository::new(ctx);
        let first = repo.default_space().unwrap();
        let second = repo.default_space().unwrap();
        assert_eq!(first.id, second.id);
    }
}
