//! Shared SQLite connection and helpers used by every repository.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::Value as Json;
use uuid::Uuid;

use crate::error::{Result, SpiralmemError};

use super::schema::SCHEMA_SQL;

/// Owns the database connection and the conventions every repository relies on:
/// id generation, timestamp generation, and JSON (de)serialization of metadata
/// columns. Repositories hold an `Arc<StoreContext>` rather than a raw connection
/// so the store can be cloned cheaply and shared across async tasks.
pub struct StoreContext {
    conn: Mutex<Connection>,
}

impl StoreContext {
    /// Open (creating if absent) the database at `path` and run schema migration.
    pub fn open(path: &str) -> Result<Arc<Self>> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Arc::new(Self {
            conn: Mutex::new(conn),
        }))
    }

    /// Open an in-memory database, used by tests.
    pub fn open_in_memory() -> Result<Arc<Self>> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Arc::new(Self {
            conn: Mutex::new(conn),
        }))
    }

    /// Lock the underlying connection for a single operation.
    pub fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn now() -> DateTime<Utc> {
        Utc::now()
    }

    pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
        Ok(serde_json::to_string(value)?)
    }

    pub fn parse_json(raw: &str) -> Result<Json> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Map an empty-row-affected write into a `NotFound` error.
pub fn require_row(affected: usize, what: &str) -> Result<()> {
    if affected == 0 {
        Err(SpiralmemError::NotFound(what.to_string()))
    } else {
        Ok(())
    }
}
