//! Console endpoints behind `/api`: the form, batch and tuning surface

pub mod batch;
pub mod predict;
pub mod schemas;
pub mod sessions;
pub mod tuning;

use axum::{
    routing::{get, post, put},
    Router,
};

use super::state::AppState;

pub fn create_console_router() -> Router<AppState> {
    Router::new()
        .route("/schemas", get(schemas::list_schemas))
        .route("/sessions", post(sessions::create_session))
        .route("/sessions/{session_id}", get(sessions::get_session))
        .route("/sessions/{session_id}/schema", put(sessions::switch_schema))
        .route("/predict", post(predict::predict))
        .route("/explain", post(predict::explain))
        .route("/generate", post(predict::generate))
        .route("/batch", post(batch::submit_batch).get(batch::list_batches))
        .route("/batch/{job_id}", get(batch::get_batch))
        .route("/batch/{job_id}/export", get(batch::export_batch))
        .route("/tune", post(tuning::submit_tuning))
        .route("/tune/{task_id}", get(tuning::tuning_status))
        .route("/tuned-models", get(tuning::list_tuned_models))
}
