use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::{Map, Value};

use super::assign_id;
use crate::application::errors::StorageError;
use crate::domain::traits::{Document, Query, Store};

/// SQLite-backed store keeping each document as a JSON body
pub struct SqliteStore {
    conn: Mutex<Option<Connection>>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                id TEXT NOT NULL,
                collection TEXT NOT NULL,
                body TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Connection>>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Backend("connection lock poisoned".to_string()))
    }

    fn load_all(conn: &Connection, collection: &str) -> Result<Vec<Document>, StorageError> {
        let mut stmt = conn.prepare("SELECT body FROM documents WHERE collection = ?1")?;
        let bodies = stmt
            .query_map(params![collection], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        bodies
            .iter()
            .map(|body| {
                let fields: Map<String, Value> = serde_json::from_str(body)?;
                Ok(Document::from_fields(fields))
            })
            .collect()
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn find(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StorageError> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(StorageError::Unavailable)?;
        Ok(query.apply(Self::load_all(conn, collection)?))
    }

    async fn save(&self, collection: &str, doc: &mut Document) -> Result<(), StorageError> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(StorageError::Unavailable)?;

        let id = assign_id(doc);
        let body = serde_json::to_string(doc.fields())?;
        conn.execute(
            "INSERT OR REPLACE INTO documents (id, collection, body) VALUES (?1, ?2, ?3)",
            params![id, collection, body],
        )?;
        Ok(())
    }

    async fn remove(&self, collection: &str, query: &Query) -> Result<usize, StorageError> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(StorageError::Unavailable)?;

        let doomed: Vec<String> = Self::load_all(conn, collection)?
            .iter()
            .filter(|doc| query.matches(doc))
            .filter_map(|doc| doc.id().map(str::to_string))
            .collect();

        for id in &doomed {
            conn.execute(
                "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
            )?;
        }
        Ok(doomed.len())
    }

    async fn close(&self) -> Result<(), StorageError> {
        if let Some(conn) = self.lock()?.take() {
            conn.close().map_err(|(_, e)| StorageError::from(e))?;
        }
        Ok(())
    }
}
