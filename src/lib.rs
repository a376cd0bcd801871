//! Exoplanet Classifier Console
//!
//! Forms, batch runs and tuning jobs against a remote exoplanet
//! classification service:
//! - Kepler and TESS measurement schemas with per-field validation
//! - Single and chunked batch predictions, base or tuned models
//! - Hyperparameter tuning with background status polling
//! - AI explanations and generated sample values via an OpenAI-compatible API
//! - Sessions and tuned model metadata in memory or PostgreSQL

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::{BatchRunner, ClassifierBackend, Session, TunedModel};
use infrastructure::{
    classifier::ClassifierApiClient,
    http_client::HttpClient,
    llm::LlmProviderFactory,
    services::{
        BatchService, ExplanationService, PredictionService, SessionService, TunedModelService,
        TuningService,
    },
    storage::StorageFactory,
};
use tracing::{info, warn};

/// Create the application state from configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let storage = StorageFactory::connect(&config.storage.to_storage_config()?).await?;
    info!(storage = ?storage.storage_type(), "Storage initialized");

    let backend: Arc<dyn ClassifierBackend> = Arc::new(ClassifierApiClient::new(
        HttpClient::with_timeout(config.backend.timeout())?,
        &config.backend.base_url,
    ));
    info!(base_url = %config.backend.base_url, "Classifier backend configured");

    let llm_provider = LlmProviderFactory::create_openai(
        config.llm.api_key.as_deref(),
        &config.llm.base_url,
        config.llm.timeout(),
    )?;

    if llm_provider.is_none() {
        warn!("No completion API key configured; AI explanations and samples are disabled");
    }

    let session_service = Arc::new(SessionService::new(storage.create::<Session>().await?));
    let tuned_model_service = Arc::new(TunedModelService::new(
        backend.clone(),
        storage.create::<TunedModel>().await?,
    ));

    let prediction_service = Arc::new(PredictionService::new(
        backend.clone(),
        session_service.clone(),
        tuned_model_service.clone(),
    ));

    let batch_service = Arc::new(
        BatchService::new(Arc::new(BatchRunner::with_chunk_size(
            backend.clone(),
            config.batch.chunk_size,
        )))
        .with_retention(config.batch.retention()),
    );

    let tuning_service = Arc::new(
        TuningService::new(backend, tuned_model_service.clone())
            .with_poll_interval(config.tuning.poll_interval()),
    );

    let explanation_service = Arc::new(ExplanationService::new(
        llm_provider,
        config.llm.model.clone(),
    ));

    Ok(AppState {
        session_service,
        prediction_service,
        batch_service,
        tuning_service,
        tuned_model_service,
        explanation_service,
    })
}
