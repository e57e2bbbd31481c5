//! In-process document table.
//!
//! Backed by `RwLock<HashMap>`; used when no database is configured and by the
//! handler tests.

use super::DocumentStore;
use crate::schema::{Document, NewDocument};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<Uuid, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner.read().map(|rows| rows.len()).unwrap_or(0)
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("document table lock poisoned")
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn insert(&self, new: NewDocument) -> Result<Document> {
        let doc = new.into_document();
        let mut rows = self.inner.write().map_err(poisoned)?;
        rows.insert(doc.id, doc.clone());
        tracing::debug!("MemoryStore: inserted {} for {}", doc.id, doc.user_id);
        Ok(doc)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Document>> {
        let rows = self.inner.read().map_err(poisoned)?;
        Ok(rows.get(&id).cloned())
    }

    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<Document>> {
        let rows = self.inner.read().map_err(poisoned)?;
        let mut docs: Vec<Document> = rows
            .values()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect();
        docs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(docs)
    }

    async fn update_text(&self, id: Uuid, text: &str) -> Result<Option<Document>> {
        let mut rows = self.inner.write().map_err(poisoned)?;
        Ok(rows.get_mut(&id).map(|doc| {
            doc.extracted_text = text.to_string();
            doc.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut rows = self.inner.write().map_err(poisoned)?;
        Ok(rows.remove(&id).is_some())
    }
}
