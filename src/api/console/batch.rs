//! Batch upload, progress and export handlers

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, info};

use crate::api::state::AppState;
use crate::api::types::{ApiError, ExportQuery, Json};
use crate::domain::Schema;
use crate::infrastructure::services::BatchJobView;

/// Fields of the upload form
#[derive(Debug, Default)]
struct BatchUpload {
    file_name: Option<String>,
    bytes: Option<Vec<u8>>,
    schema: Option<Schema>,
    tuned_model: Option<String>,
}

async fn read_upload(mut multipart: Multipart) -> Result<BatchUpload, ApiError> {
    let mut upload = BatchUpload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                upload.file_name = field.file_name().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?;
                upload.bytes = Some(data.to_vec());
            }
            "schema" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read schema: {}", e)))?;
                let schema = Schema::parse(&text)
                    .map_err(|e| ApiError::bad_request(e.to_string()).with_param("schema"))?;
                upload.schema = Some(schema);
            }
            "tuned_model" => {
                let text = field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("Failed to read tuned_model: {}", e))
                })?;
                upload.tuned_model = Some(text);
            }
            other => debug!(field = %other, "Ignoring unknown upload field"),
        }
    }

    Ok(upload)
}

/// POST /api/batch
///
/// Multipart form with `file` (CSV), `schema` and an optional `tuned_model`.
/// File problems are reported here; prediction runs in the background.
pub async fn submit_batch(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<BatchJobView>), ApiError> {
    let upload = read_upload(multipart).await?;

    let schema = upload
        .schema
        .ok_or_else(|| ApiError::bad_request("Missing 'schema' field").with_param("schema"))?;
    let bytes = upload
        .bytes
        .ok_or_else(|| ApiError::file_format("No file uploaded").with_param("file"))?;

    let target = state
        .prediction_service
        .resolve_target(schema, upload.tuned_model.as_deref())
        .await?;

    let job = state
        .batch_service
        .submit(schema, target, upload.file_name, &bytes)?;

    info!(job_id = %job.id, rows = job.total_rows, "Batch upload accepted");
    Ok((StatusCode::ACCEPTED, Json(job)))
}

/// GET /api/batch
pub async fn list_batches(
    State(state): State<AppState>,
) -> Result<Json<Vec<BatchJobView>>, ApiError> {
    Ok(Json(state.batch_service.list()?))
}

/// GET /api/batch/{job_id}
pub async fn get_batch(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<BatchJobView>, ApiError> {
    Ok(Json(state.batch_service.get(&job_id)?))
}

/// GET /api/batch/{job_id}/export?columns=a,b
pub async fn export_batch(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let columns = query.column_list();
    let csv = state.batch_service.export(&job_id, columns.as_deref())?;

    let disposition = format!("attachment; filename=\"predictions-{}.csv\"", job_id);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}
