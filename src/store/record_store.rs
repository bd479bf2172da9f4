//! SQLite-backed key-value store for posted records

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::types::Record;

/// Key-value table of JSON records
pub struct RecordStore {
    conn: Mutex<Connection>,
}

impl RecordStore {
    /// Open or create the database
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::with_connection(Connection::open(path)?)
    }

    /// Non-persistent store, used by the `routes` command and tests
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                id TEXT PRIMARY KEY,
                body TEXT NOT NULL,
                stored_at TEXT NOT NULL
            );
            "#,
        )?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Store("record store lock poisoned".into()))
    }

    /// Insert a record, replacing any previous value under the same key
    pub fn put(&self, record: &Record) -> Result<()> {
        let body = serde_json::to_string(&record.body)?;
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO records (id, body, stored_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                body = excluded.body,
                stored_at = excluded.stored_at
            "#,
            params![record.id, body, record.stored_at.to_rfc3339()],
        )?;

        Ok(())
    }

    /// Look up a record by key
    pub fn get(&self, id: &str) -> Result<Option<Record>> {
        let conn = self.conn()?;

        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT body, stored_at FROM records WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((body, stored_at)) = row else {
            return Ok(None);
        };

        let stored_at = DateTime::parse_from_rfc3339(&stored_at)
            .map_err(|e| Error::Store(format!("bad timestamp for record {id}: {e}")))?
            .with_timezone(&Utc);

        Ok(Some(Record {
            id: id.to_string(),
            body: serde_json::from_str(&body)?,
            stored_at,
        }))
    }

    /// Number of stored records
    pub fn count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_put_and_get() {
        let store = RecordStore::open_in_memory().unwrap();
        let record = Record::new(json!({"text": "The quick brown fox"}));

        store.put(&record).unwrap();

        let loaded = store.get(&record.id).unwrap().expect("record should exist");
        assert_eq!(loaded.body, record.body);
        assert_eq!(loaded.stored_at.timestamp(), record.stored_at.timestamp());
    }

    #[test]
    fn test_get_missing() {
        let store = RecordStore::open_in_memory().unwrap();
        assert!(store.get("nope").unwrap().is_none());
    }

    #[test]
    fn test_put_replaces_existing_key() {
        let store = RecordStore::open_in_memory().unwrap();

        store.put(&Record::new(json!({"id": "a", "v": 1}))).unwrap();
        store.put(&Record::new(json!({"id": "a", "v": 2}))).unwrap();

        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get("a").unwrap().unwrap().body["v"], 2);
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("data").join("records.db");

        {
            let store = RecordStore::open(&db_path).unwrap();
            store.put(&Record::new(json!({"id": "kept"}))).unwrap();
        }

        let store = RecordStore::open(&db_path).unwrap();
        assert!(store.get("kept").unwrap().is_some());
    }
}
