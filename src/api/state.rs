//! Application state for shared services

use std::sync::Arc;

use crate::infrastructure::services::{
    BatchService, ExplanationService, PredictionService, SessionService, TunedModelService,
    TuningService,
};

/// Services shared by every handler
#[derive(Clone, Debug)]
pub struct AppState {
    pub session_service: Arc<SessionService>,
    pub prediction_service: Arc<PredictionService>,
    pub batch_service: Arc<BatchService>,
    pub tuning_service: Arc<TuningService>,
    pub tuned_model_service: Arc<TunedModelService>,
    pub explanation_service: Arc<ExplanationService>,
}
