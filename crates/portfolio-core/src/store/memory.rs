//! In-memory [`DocumentStore`] implementation for testing and embedding.
//!
//! Uses a `HashMap` of collection name to insertion-ordered `Vec` behind
//! `std::sync::RwLock`. Sorting is a stable sort over the selected field,
//! so ties keep insertion order.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde_json::Value;

use super::{
    check_field_name, compare_values, matches_filter, Document, DocumentStore, Filter, Patch,
    Sort, SortDirection,
};

struct StoredDocument {
    id: String,
    document: Document,
}

/// In-memory document store.
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Vec<StoredDocument>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Vec<StoredDocument>>>> {
        self.collections
            .read()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Vec<StoredDocument>>>> {
        self.collections
            .write()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }

    /// Number of documents currently held in `collection`.
    pub fn len(&self, collection: &str) -> Result<usize> {
        Ok(self.read()?.get(collection).map_or(0, Vec::len))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert_one(&self, collection: &str, id: &str, document: Document) -> Result<u64> {
        let mut collections = self.write()?;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.iter().any(|d| d.id == id) {
            bail!("duplicate id {} in collection {}", id, collection);
        }
        docs.push(StoredDocument {
            id: id.to_string(),
            document,
        });
        Ok(1)
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        sort: Option<&Sort>,
        limit: usize,
    ) -> Result<Vec<Document>> {
        for field in filter.keys() {
            check_field_name(field)?;
        }
        if let Some(sort) = sort {
            check_field_name(&sort.field)?;
        }

        let collections = self.read()?;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<&Document> = docs
            .iter()
            .map(|d| &d.document)
            .filter(|d| matches_filter(d, filter))
            .collect();

        if let Some(sort) = sort {
            matched.sort_by(|a, b| {
                let av = a.get(&sort.field).unwrap_or(&Value::Null);
                let bv = b.get(&sort.field).unwrap_or(&Value::Null);
                match sort.direction {
                    SortDirection::Ascending => compare_values(av, bv),
                    SortDirection::Descending => compare_values(bv, av),
                }
            });
        }

        Ok(matched.into_iter().take(limit).cloned().collect())
    }

    async fn update_one(&self, collection: &str, filter: &Filter, patch: &Patch) -> Result<u64> {
        for field in filter.keys().chain(patch.keys()) {
            check_field_name(field)?;
        }
        if patch.is_empty() {
            bail!("update patch must set at least one field");
        }

        let mut collections = self.write()?;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let Some(stored) = docs
            .iter_mut()
            .find(|d| matches_filter(&d.document, filter))
        else {
            return Ok(0);
        };

        let unchanged = patch
            .iter()
            .all(|(field, value)| stored.document.get(field) == Some(value));
        if unchanged {
            return Ok(0);
        }

        for (field, value) in patch {
            stored.document.insert(field.clone(), value.clone());
        }
        Ok(1)
    }
}
