//! Infrastructure services

mod batch_service;
mod explanation_service;
mod prediction_service;
mod session_service;
mod tuned_model_service;
mod tuning_service;

pub use batch_service::{BatchJobStatus, BatchJobView, BatchService};
pub use explanation_service::ExplanationService;
pub use prediction_service::{PredictRequest, PredictionOutcome, PredictionService};
pub use session_service::SessionService;
pub use tuned_model_service::{TunedModelService, TunedModelSource};
pub use tuning_service::{spawn_poller, TuningPollHandle, TuningService, DEFAULT_POLL_INTERVAL};
