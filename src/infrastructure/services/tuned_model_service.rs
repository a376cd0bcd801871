//! Tuned model service - mirrors backend tuned model metadata locally

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::domain::{ClassifierBackend, DocumentStore, DomainError, Schema, TunedModel, TunedModelId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunedModelSource {
    /// Fetch from the backend and update the local mirror
    Backend,
    /// Local mirror only
    Cached,
}

pub struct TunedModelService {
    backend: Arc<dyn ClassifierBackend>,
    store: Arc<dyn DocumentStore<TunedModel>>,
}

impl std::fmt::Debug for TunedModelService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TunedModelService")
            .field("store", &self.store)
            .finish()
    }
}

fn newest_first(mut models: Vec<TunedModel>) -> Vec<TunedModel> {
    models.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    models
}

impl TunedModelService {
    pub fn new(backend: Arc<dyn ClassifierBackend>, store: Arc<dyn DocumentStore<TunedModel>>) -> Self {
        Self { backend, store }
    }

    /// Fetch the backend list, mirror it, and return it newest first
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Vec<TunedModel>, DomainError> {
        let models = self.backend.tuned_models().await?;

        for model in &models {
            self.store.upsert(model.clone()).await?;
        }

        info!(count = models.len(), "Refreshed tuned models");
        Ok(newest_first(models))
    }

    #[instrument(skip(self))]
    pub async fn list(&self, source: TunedModelSource) -> Result<Vec<TunedModel>, DomainError> {
        match source {
            TunedModelSource::Backend => self.refresh().await,
            TunedModelSource::Cached => Ok(newest_first(self.store.list().await?)),
        }
    }

    /// Tuned models for one base schema, newest first
    pub async fn list_for_schema(
        &self,
        schema: Schema,
        source: TunedModelSource,
    ) -> Result<Vec<TunedModel>, DomainError> {
        Ok(self
            .list(source)
            .await?
            .into_iter()
            .filter(|m| m.schema() == Some(schema))
            .collect())
    }

    /// Look up a mirrored model without calling the backend
    pub async fn find(&self, id: &TunedModelId) -> Result<Option<TunedModel>, DomainError> {
        self.store.get(id).await
    }

    /// Refresh after a tuning run finished; failures are logged, not returned
    pub async fn record_tuning_success(&self) {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "Could not refresh tuned models after tuning");
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::domain::classifier::MockClassifierBackend;
    use crate::infrastructure::storage::InMemoryStore;

    fn model(id: &str, name: &str, day: u32) -> TunedModel {
        TunedModel {
            id: TunedModelId::new(id).unwrap(),
            model_name: name.to_string(),
            hyperparameters: Default::default(),
            accuracy: 0.9,
            created_at: Utc.with_ymd_and_hms(2024, 9, day, 12, 0, 0).unwrap(),
        }
    }

    fn backend_with(models: Vec<TunedModel>) -> MockClassifierBackend {
        let mut backend = MockClassifierBackend::new();
        backend
            .expect_tuned_models()
            .returning(move || Ok(models.clone()));
        backend
    }

    #[tokio::test]
    async fn test_refresh_mirrors_and_sorts_newest_first() {
        let store = Arc::new(InMemoryStore::<TunedModel>::new());
        let backend = backend_with(vec![
            model("aaaaaaaaaaaaaaaaaaaaaaaa", "kepler", 1),
            model("bbbbbbbbbbbbbbbbbbbbbbbb", "tess", 3),
            model("cccccccccccccccccccccccc", "kepler", 2),
        ]);
        let service = TunedModelService::new(Arc::new(backend), store.clone());

        let models = service.list(TunedModelSource::Backend).await.unwrap();
        let ids: Vec<String> = models.iter().map(|m| m.id.to_string()).collect();
        assert_eq!(
            ids,
            vec![
                "bbbbbbbbbbbbbbbbbbbbbbbb",
                "cccccccccccccccccccccccc",
                "aaaaaaaaaaaaaaaaaaaaaaaa"
            ]
        );
        assert_eq!(store.count().await.unwrap(), 3);

        let kepler = service
            .list_for_schema(Schema::Kepler, TunedModelSource::Cached)
            .await
            .unwrap();
        assert_eq!(kepler.len(), 2);
        assert_eq!(kepler[0].id.as_str(), "cccccccccccccccccccccccc");
    }

    #[tokio::test]
    async fn test_cached_list_does_not_call_backend() {
        let mut backend = MockClassifierBackend::new();
        backend.expect_tuned_models().times(0);
        let store = Arc::new(InMemoryStore::with_documents(vec![model(
            "aaaaaaaaaaaaaaaaaaaaaaaa",
            "tess",
            1,
        )]));
        let service = TunedModelService::new(Arc::new(backend), store);

        let models = service.list(TunedModelSource::Cached).await.unwrap();
        assert_eq!(models.len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_failure_is_returned() {
        let mut backend = MockClassifierBackend::new();
        backend
            .expect_tuned_models()
            .returning(|| Err(DomainError::backend("connection refused")));
        let service = TunedModelService::new(Arc::new(backend), Arc::new(InMemoryStore::new()));

        assert!(service.refresh().await.is_err());
        service.record_tuning_success().await;
    }
}
