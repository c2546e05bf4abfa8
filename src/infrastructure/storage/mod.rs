//! Document store implementations

mod sqlite;

pub use sqlite::SqliteStore;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::errors::StorageError;
use crate::domain::traits::{Document, Query, Store, ID_FIELD};

type Collection = HashMap<String, Document>;

/// In-process store; contents are lost when it is dropped
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> Result<(), StorageError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable);
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Give an unsaved document its id and return it
pub(crate) fn assign_id(doc: &mut Document) -> String {
    match doc.id() {
        Some(id) => id.to_string(),
        None => {
            let id = uuid::Uuid::new_v4().to_string();
            doc.set(ID_FIELD, id.as_str());
            id
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StorageError> {
        self.ensure_open()?;
        let collections = self.collections.read().await;
        let docs = collections
            .get(collection)
            .map(|c| c.values().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        Ok(query.apply(docs))
    }

    async fn save(&self, collection: &str, doc: &mut Document) -> Result<(), StorageError> {
        self.ensure_open()?;
        let id = assign_id(doc);
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id, doc.clone());
        Ok(())
    }

    async fn remove(&self, collection: &str, query: &Query) -> Result<usize, StorageError> {
        self.ensure_open()?;
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };

        let before = docs.len();
        docs.retain(|_, doc| !query.matches(doc));
        Ok(before - docs.len())
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
