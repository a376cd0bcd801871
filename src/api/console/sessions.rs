//! Anonymous session handlers

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, CreateSessionRequest, Json, SwitchSchemaRequest};
use crate::domain::Session;

/// POST /api/sessions
///
/// The body is optional; without one the session starts on the Kepler form.
pub async fn create_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Session>), ApiError> {
    let request: CreateSessionRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CreateSessionRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON data: {}", e)))?
    };
    let schema = request.schema.unwrap_or_default();
    debug!(schema = %schema, "Creating session");

    let session = state.session_service.create(schema).await?;

    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /api/sessions/{session_id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Session>, ApiError> {
    Ok(Json(state.session_service.get(&session_id).await?))
}

/// PUT /api/sessions/{session_id}/schema
pub async fn switch_schema(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<SwitchSchemaRequest>,
) -> Result<Json<Session>, ApiError> {
    debug!(session_id = %session_id, schema = %request.schema, "Switching schema");

    let session = state
        .session_service
        .switch_schema(&session_id, request.schema)
        .await?;

    Ok(Json(session))
}
