//! Schema catalogue

use crate::api::types::{Json, SchemaInfo, SchemasResponse};
use crate::domain::Schema;

/// GET /api/schemas
pub async fn list_schemas() -> Json<SchemasResponse> {
    Json(SchemasResponse {
        schemas: Schema::ALL.into_iter().map(SchemaInfo::from).collect(),
    })
}
