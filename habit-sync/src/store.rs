use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{SyncError, SyncResult};

/// A JSON document: top-level field name to value
pub type Document = Map<String, Value>;

/// Remote document store holding the authoritative copies of shared items.
///
/// Collection paths are `/`-joined, e.g. `users/ana@example.com/habits`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document; `None` when it does not exist
    async fn get(&self, collection: &str, id: &str) -> SyncResult<Option<Document>>;

    /// Write a document. With `merge` the given top-level fields replace the
    /// stored ones and the rest are kept; without it the document is replaced.
    async fn set(&self, collection: &str, id: &str, data: Document, merge: bool) -> SyncResult<()>;

    /// Delete a document; deleting a missing document is not an error
    async fn delete(&self, collection: &str, id: &str) -> SyncResult<()>;

    /// Ids of the documents in a collection
    async fn list(&self, collection: &str) -> SyncResult<Vec<String>>;
}

/// In-memory document store for testing and development
pub struct InMemoryDocumentStore {
    documents: Arc<DashMap<String, DashMap<String, Document>>>,
    /// Writes still allowed before the store starts failing; `usize::MAX` is unlimited
    write_budget: AtomicUsize,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(DashMap::new()),
            write_budget: AtomicUsize::new(usize::MAX),
        }
    }

    /// Make every subsequent `set` and `delete` fail with a network error
    pub fn set_fail_writes(&self, fail: bool) {
        let budget = if fail { 0 } else { usize::MAX };
        self.write_budget.store(budget, Ordering::SeqCst);
    }

    /// Let `writes` more writes succeed, then fail like [`Self::set_fail_writes`]
    pub fn fail_writes_after(&self, writes: usize) {
        self.write_budget.store(writes, Ordering::SeqCst);
    }

    /// Total number of stored documents across collections
    pub fn document_count(&self) -> usize {
        self.documents.iter().map(|c| c.value().len()).sum()
    }

    fn check_writable(&self, collection: &str, id: &str) -> SyncResult<()> {
        let spent = self
            .write_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                0 => None,
                usize::MAX => Some(usize::MAX),
                n => Some(n - 1),
            });
        match spent {
            Ok(_) => Ok(()),
            Err(_) => Err(SyncError::Network(format!("write to {collection}/{id} failed: store unavailable"))),
        }
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> SyncResult<Option<Document>> {
        Ok(self
            .documents
            .get(collection)
            .and_then(|docs| docs.get(id).map(|doc| doc.value().clone())))
    }

    async fn set(&self, collection: &str, id: &str, data: Document, merge: bool) -> SyncResult<()> {
        self.check_writable(collection, id)?;

        let docs = self.documents.entry(collection.to_string()).or_default();
        if merge {
            let mut existing = docs.entry(id.to_string()).or_default();
            for (field, value) in data {
                existing.insert(field, value);
            }
        } else {
            docs.insert(id.to_string(), data);
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> SyncResult<()> {
        self.check_writable(collection, id)?;

        if let Some(docs) = self.documents.get(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn list(&self, collection: &str) -> SyncResult<Vec<String>> {
        let mut ids: Vec<String> = self
            .documents
            .get(collection)
            .map(|docs| docs.iter().map(|entry| entry.key().clone()).collect())
            .unwrap_or_default();
        ids.sort();
        Ok(ids)
    }
}
