//! Document store trait

use std::fmt::Debug;

use async_trait::async_trait;

use super::Document;
use crate::domain::DomainError;

/// CRUD access to one collection of documents
#[async_trait]
pub trait DocumentStore<D>: Send + Sync + Debug
where
    D: Document + 'static,
{
    async fn get(&self, key: &D::Key) -> Result<Option<D>, DomainError>;

    async fn list(&self) -> Result<Vec<D>, DomainError>;

    /// Inserts a new document; fails with `Conflict` when the key is taken
    async fn insert(&self, document: D) -> Result<D, DomainError>;

    /// Replaces an existing document; fails with `NotFound` when absent
    async fn replace(&self, document: D) -> Result<D, DomainError>;

    /// Inserts or replaces
    async fn upsert(&self, document: D) -> Result<D, DomainError> {
        if self.get(document.key()).await?.is_some() {
            self.replace(document).await
        } else {
            self.insert(document).await
        }
    }

    async fn delete(&self, key: &D::Key) -> Result<bool, DomainError>;

    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.list().await?.len())
    }
}
