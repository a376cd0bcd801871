//! Tuning and tuned model handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{
    ApiError, Json, TuneBody, TuneSubmitResponse, TunedModelsQuery, TunedModelsResponse,
};
use crate::domain::TuningTask;
use crate::infrastructure::services::TunedModelSource;

/// POST /api/tune
///
/// 200 with the result when the backend tuned inline, 202 with a task id when
/// it queued the work.
pub async fn submit_tuning(
    State(state): State<AppState>,
    Json(body): Json<TuneBody>,
) -> Result<(StatusCode, Json<TuneSubmitResponse>), ApiError> {
    debug!(schema = %body.schema, params = body.hyperparameters.params().len(), "Tuning requested");

    let response = TuneSubmitResponse::from(
        state
            .tuning_service
            .submit(body.schema, body.hyperparameters)
            .await?,
    );

    let status = match response {
        TuneSubmitResponse::Queued { .. } => StatusCode::ACCEPTED,
        TuneSubmitResponse::Completed { .. } => StatusCode::OK,
    };

    Ok((status, Json(response)))
}

/// GET /api/tune/{task_id}
pub async fn tuning_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<TuningTask>, ApiError> {
    Ok(Json(state.tuning_service.status(&task_id).await?))
}

/// GET /api/tuned-models?cached=true&schema=kepler
pub async fn list_tuned_models(
    State(state): State<AppState>,
    Query(query): Query<TunedModelsQuery>,
) -> Result<Json<TunedModelsResponse>, ApiError> {
    let source = if query.cached {
        TunedModelSource::Cached
    } else {
        TunedModelSource::Backend
    };

    let models = match query.schema {
        Some(schema) => {
            state
                .tuned_model_service
                .list_for_schema(schema, source)
                .await?
        }
        None => state.tuned_model_service.list(source).await?,
    };

    Ok(Json(TunedModelsResponse { models }))
}
