//! Contract of the remote classification service

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::domain::features::FeatureVector;
use crate::domain::prediction::{PredictionResult, PredictionTarget};
use crate::domain::tuning::{TuneResponse, TunedModel, TuningRequest, TuningStatusResponse, TuningTaskId};
use crate::domain::DomainError;

/// Remote inference and tuning service. Every call maps to one HTTP request;
/// nothing is retried.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClassifierBackend: Send + Sync {
    /// `POST /predict` or `POST /predict_tuned` depending on the target
    async fn predict(
        &self,
        target: &PredictionTarget,
        features: &FeatureVector,
    ) -> Result<PredictionResult, DomainError>;

    /// `POST /tune_model`
    async fn tune(&self, request: &TuningRequest) -> Result<TuneResponse, DomainError>;

    /// `GET /tuning_status/{task_id}`
    async fn tuning_status(&self, task_id: &TuningTaskId)
        -> Result<TuningStatusResponse, DomainError>;

    /// `GET /tuned_models`
    async fn tuned_models(&self) -> Result<Vec<TunedModel>, DomainError>;
}
