//! HTTP request, response and error types

pub mod console;
pub mod error;
pub mod json;

pub use console::{
    ClassProbability, CreateSessionRequest, ExplainBody, ExplainResponse, ExportQuery,
    GenerateBody, GenerateResponse, PredictBody, PredictResponse, SchemaInfo, SchemasResponse,
    SwitchSchemaRequest, TuneBody, TuneSubmitResponse, TunedModelsQuery, TunedModelsResponse,
};
pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use json::Json;
