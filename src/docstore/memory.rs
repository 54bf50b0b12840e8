//! In-process document store.
//!
//! Collections are insertion-ordered vectors behind one `RwLock`, so list
//! order matches write order and `move_document` is atomic by holding the
//! write lock across both halves. Used by tests and offline runs.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::{Document, DocumentStore, Fields, StoreError, generate_document_id};

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently in `collection`.
    pub async fn count(&self, collection: &str) -> usize {
        let collections = self.collections.read().await;
        collections.get(collection).map_or(0, Vec::len)
    }

    /// Look up a single document without going through the trait.
    pub async fn get(&self, collection: &str, id: &str) -> Option<Document> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .cloned()
    }
}

fn not_found(collection: &str, id: &str) -> StoreError {
    StoreError::NotFound { collection: collection.to_string(), id: id.to_string() }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn list_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    async fn insert(&self, collection: &str, fields: &Fields) -> Result<String, StoreError> {
        let id = generate_document_id();
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(Document { id: id.clone(), fields: fields.clone() });
        Ok(id)
    }

    async fn update_fields(&self, collection: &str, id: &str, patch: &Fields) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| not_found(collection, id))?;
        for (key, value) in patch {
            doc.fields.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(collection) {
            docs.retain(|d| d.id != id);
        }
        Ok(())
    }

    async fn move_document(&self, from: &str, id: &str, to: &str, fields: &Fields) -> Result<String, StoreError> {
        let mut collections = self.collections.write().await;
        let source = collections
            .get_mut(from)
            .ok_or_else(|| not_found(from, id))?;
        let pos = source
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| not_found(from, id))?;
        source.remove(pos);

        let new_id = generate_document_id();
        collections
            .entry(to.to_string())
            .or_default()
            .push(Document { id: new_id.clone(), fields: fields.clone() });
        Ok(new_id)
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
