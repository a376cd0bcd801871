use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use crate::domain::{
    ClassifierBackend, DomainError, FeatureVector, PredictionResult, PredictionTarget,
    TuneResponse, TunedModel, TuningRequest, TuningStatusResponse, TuningTaskId,
};
use crate::infrastructure::http_client::HttpClientTrait;

/// HTTP client for the model-serving backend
#[derive(Debug)]
pub struct ClassifierApiClient<C: HttpClientTrait> {
    client: C,
    base_url: String,
}

impl<C: HttpClientTrait> ClassifierApiClient<C> {
    pub fn new(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn headers() -> Vec<(&'static str, &'static str)> {
        vec![("Accept", "application/json")]
    }
}

fn parse<T: DeserializeOwned>(what: &str, json: Value) -> Result<T, DomainError> {
    serde_json::from_value(json)
        .map_err(|e| DomainError::backend(format!("Unexpected {} response: {}", what, e)))
}

#[async_trait]
impl<C: HttpClientTrait> ClassifierBackend for ClassifierApiClient<C> {
    async fn predict(
        &self,
        target: &PredictionTarget,
        features: &FeatureVector,
    ) -> Result<PredictionResult, DomainError> {
        let url = self.url(target.endpoint());
        let body = json!({
            "model": target.model_param(),
            "features": features.values(),
        });

        debug!(%url, %target, "Sending prediction request");

        let response = self.client.post_json(&url, Self::headers(), &body).await?;
        parse("prediction", response)
    }

    async fn tune(&self, request: &TuningRequest) -> Result<TuneResponse, DomainError> {
        let url = self.url("tune_model");
        let body = serde_json::to_value(request)
            .map_err(|e| DomainError::internal(format!("Failed to encode tuning request: {}", e)))?;

        debug!(%url, model = %request.model, "Submitting tuning request");

        let response = self.client.post_json(&url, Self::headers(), &body).await?;
        parse("tuning", response)
    }

    async fn tuning_status(&self, task_id: &TuningTaskId) -> Result<TuningStatusResponse, DomainError> {
        let url = self.url(&format!("tuning_status/{}", task_id));
        let response = self.client.get_json(&url, Self::headers()).await?;
        parse("tuning status", response)
    }

    async fn tuned_models(&self) -> Result<Vec<TunedModel>, DomainError> {
        let url = self.url("tuned_models");
        let response = self.client.get_json(&url, Self::headers()).await?;
        parse("tuned model list", response)
    }
}
