//! In-memory document store

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::storage::{Document, DocumentKey, DocumentStore};
use crate::domain::DomainError;

/// Thread-safe in-memory document store
///
/// Default backend for development and tests. Documents are lost when the
/// process exits.
#[derive(Debug)]
pub struct InMemoryStore<D>
where
    D: Document,
{
    documents: RwLock<HashMap<String, D>>,
}

impl<D> Default for InMemoryStore<D>
where
    D: Document,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<D> InMemoryStore<D>
where
    D: Document,
{
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
        }
    }

    /// Store pre-populated with documents
    pub fn with_documents(documents: Vec<D>) -> Self {
        let map = documents
            .into_iter()
            .map(|d| (d.key().as_str().to_string(), d))
            .collect();

        Self {
            documents: RwLock::new(map),
        }
    }
}

fn lock_error(e: impl std::fmt::Display) -> DomainError {
    DomainError::storage(format!("Failed to acquire lock: {}", e))
}

#[async_trait]
impl<D> DocumentStore<D> for InMemoryStore<D>
where
    D: Document + 'static,
{
    async fn get(&self, key: &D::Key) -> Result<Option<D>, DomainError> {
        let documents = self.documents.read().map_err(lock_error)?;
        Ok(documents.get(key.as_str()).cloned())
    }

    async fn list(&self) -> Result<Vec<D>, DomainError> {
        let documents = self.documents.read().map_err(lock_error)?;
        Ok(documents.values().cloned().collect())
    }

    async fn insert(&self, document: D) -> Result<D, DomainError> {
        let key = document.key().as_str().to_string();
        let mut documents = self.documents.write().map_err(lock_error)?;

        if documents.contains_key(&key) {
            return Err(DomainError::conflict(format!(
                "Document '{}' already exists in {}",
                key,
                D::COLLECTION
            )));
        }

        documents.insert(key, document.clone());
        Ok(document)
    }

    async fn replace(&self, document: D) -> Result<D, DomainError> {
        let key = document.key().as_str().to_string();
        let mut documents = self.documents.write().map_err(lock_error)?;

        if !documents.contains_key(&key) {
            return Err(DomainError::not_found(format!(
                "Document '{}' not found in {}",
                key,
                D::COLLECTION
            )));
        }

        documents.insert(key, document.clone());
        Ok(document)
    }

    async fn upsert(&self, document: D) -> Result<D, DomainError> {
        let mut documents = self.documents.write().map_err(lock_error)?;
        documents.insert(document.key().as_str().to_string(), document.clone());
        Ok(document)
    }

    async fn delete(&self, key: &D::Key) -> Result<bool, DomainError> {
        let mut documents = self.documents.write().map_err(lock_error)?;
        Ok(documents.remove(key.as_str()).is_some())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let documents = self.documents.read().map_err(lock_error)?;
        Ok(documents.len())
    }
}
