//! Domain layer - schemas, form validation, prediction, batch and tuning logic

pub mod batch;
pub mod classifier;
pub mod error;
pub mod explanation;
pub mod features;
pub mod llm;
pub mod prediction;
pub mod schema;
pub mod session;
pub mod storage;
pub mod tuning;

pub use batch::{BatchError, BatchOutcome, BatchProgress, BatchRunner, BatchTable};
pub use classifier::ClassifierBackend;
pub use error::DomainError;
pub use features::{FeatureVector, FieldInput, FormState, ValidationErrors};
pub use llm::{CompletionRequest, CompletionResponse, LlmProvider};
pub use prediction::{PredictionResult, PredictionTarget};
pub use schema::{FieldSpec, Schema};
pub use session::{Session, SessionId};
pub use storage::{Document, DocumentKey, DocumentStore};
pub use tuning::{
    HyperparameterGrid, HyperparameterValue, TuneResponse, TunedModel, TunedModelId,
    TuningRequest, TuningResult, TuningStatus, TuningStatusResponse, TuningTask, TuningTaskId,
};
