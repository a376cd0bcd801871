//! Prediction, explanation and sample generation handlers

use axum::extract::State;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{
    ApiError, ExplainBody, ExplainResponse, GenerateBody, GenerateResponse, Json, PredictBody,
    PredictResponse,
};
use crate::domain::explanation::ExplanationInput;
use crate::domain::features::validate_form;
use crate::domain::DomainError;
use crate::infrastructure::services::PredictRequest;

/// POST /api/predict
pub async fn predict(
    State(state): State<AppState>,
    Json(body): Json<PredictBody>,
) -> Result<Json<PredictResponse>, ApiError> {
    debug!(schema = %body.schema, tuned = ?body.tuned_model, "Prediction requested");

    let outcome = state
        .prediction_service
        .predict(PredictRequest {
            schema: body.schema,
            values: body.values,
            tuned_model: body.tuned_model,
            session_id: body.session_id,
        })
        .await?;

    Ok(Json(PredictResponse::from(outcome)))
}

/// POST /api/explain
pub async fn explain(
    State(state): State<AppState>,
    Json(body): Json<ExplainBody>,
) -> Result<Json<ExplainResponse>, ApiError> {
    let features = validate_form(body.schema, &body.values).map_err(DomainError::from)?;

    if !(0.0..=1.0).contains(&body.confidence) {
        return Err(ApiError::unprocessable("Confidence must be between 0 and 1").with_param("confidence"));
    }

    let prediction = body.prediction.trim();
    if prediction.is_empty() {
        return Err(ApiError::unprocessable("Prediction cannot be empty").with_param("prediction"));
    }

    let input = ExplanationInput {
        features,
        prediction: prediction.to_string(),
        confidence: body.confidence,
    };

    let explanation = state.explanation_service.explain(&input).await?;

    Ok(Json(ExplainResponse { explanation }))
}

/// POST /api/generate
pub async fn generate(
    State(state): State<AppState>,
    Json(body): Json<GenerateBody>,
) -> Result<Json<GenerateResponse>, ApiError> {
    debug!(schema = %body.schema, "Sample generation requested");

    if let Some(ref session_id) = body.session_id {
        state.session_service.get(session_id).await?;
    }

    let vector = state
        .explanation_service
        .generate_sample(body.schema, body.hint.as_deref())
        .await?;

    if let Some(ref session_id) = body.session_id {
        state.session_service.fill(session_id, &vector).await?;
    }

    Ok(Json(GenerateResponse::from(vector)))
}
