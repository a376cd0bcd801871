//! Prediction service - validates a form submission and classifies it

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, instrument, warn};

use super::{SessionService, TunedModelService};
use crate::domain::features::validate_form;
use crate::domain::{
    ClassifierBackend, DomainError, FeatureVector, FieldInput, PredictionResult, PredictionTarget,
    Schema, TunedModelId,
};
use crate::infrastructure::observability::record_prediction;

/// One form submission
#[derive(Debug, Clone)]
pub struct PredictRequest {
    pub schema: Schema,
    pub values: BTreeMap<String, FieldInput>,
    pub tuned_model: Option<String>,
    pub session_id: Option<String>,
}

/// Successful submission: the validated inputs and the backend's answer
#[derive(Debug, Clone, Serialize)]
pub struct PredictionOutcome {
    pub features: FeatureVector,
    pub result: PredictionResult,
}

pub struct PredictionService {
    backend: Arc<dyn ClassifierBackend>,
    sessions: Arc<SessionService>,
    tuned_models: Arc<TunedModelService>,
}

impl std::fmt::Debug for PredictionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionService").finish_non_exhaustive()
    }
}

impl PredictionService {
    pub fn new(
        backend: Arc<dyn ClassifierBackend>,
        sessions: Arc<SessionService>,
        tuned_models: Arc<TunedModelService>,
    ) -> Self {
        Self {
            backend,
            sessions,
            tuned_models,
        }
    }

    /// Resolve the model a submission goes to. A tuned model known locally
    /// must have been trained on the submitted schema.
    pub async fn resolve_target(
        &self,
        schema: Schema,
        tuned_model: Option<&str>,
    ) -> Result<PredictionTarget, DomainError> {
        let Some(raw) = tuned_model.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(PredictionTarget::Base(schema));
        };

        let id = TunedModelId::new(raw)?;

        if let Some(model) = self.tuned_models.find(&id).await? {
            if let Some(trained_on) = model.schema().filter(|s| *s != schema) {
                return Err(DomainError::validation(format!(
                    "Tuned model {} was trained on {} data, not {}",
                    id,
                    trained_on.display_name(),
                    schema.display_name()
                )));
            }
        }

        Ok(PredictionTarget::Tuned(id))
    }

    /// Validate and classify. Yields exactly one result or one error; nothing
    /// is sent to the backend when validation fails or the session is unknown.
    #[instrument(skip(self, request), fields(schema = %request.schema, session = ?request.session_id))]
    pub async fn predict(&self, request: PredictRequest) -> Result<PredictionOutcome, DomainError> {
        let features = validate_form(request.schema, &request.values)?;
        let target = self
            .resolve_target(request.schema, request.tuned_model.as_deref())
            .await?;

        if let Some(ref session_id) = request.session_id {
            self.sessions.get(session_id).await?;
        }

        let started = Instant::now();
        let result = self.backend.predict(&target, &features).await;
        let kind = match target {
            PredictionTarget::Base(_) => "base",
            PredictionTarget::Tuned(_) => "tuned",
        };
        record_prediction(kind, result.is_ok(), started.elapsed());

        match result {
            Ok(result) => {
                info!(
                    %target,
                    prediction = %result.prediction,
                    confidence = result.confidence,
                    "Prediction completed"
                );

                if let Some(ref session_id) = request.session_id {
                    self.sessions
                        .record_prediction(session_id, request.schema, &request.values, result.clone())
                        .await?;
                }

                Ok(PredictionOutcome { features, result })
            }
            Err(e) => {
                warn!(%target, error = %e, "Prediction failed");

                if let Some(ref session_id) = request.session_id {
                    if let Err(clear_err) = self.sessions.clear_prediction(session_id).await {
                        warn!(error = %clear_err, "Could not clear session prediction");
                    }
                }

                Err(e)
            }
        }
    }

    /// Classify an already validated vector
    pub async fn predict_vector(
        &self,
        target: &PredictionTarget,
        features: &FeatureVector,
    ) -> Result<PredictionResult, DomainError> {
        self.backend.predict(target, features).await
    }
}
