//! Hyperparameter tuning tasks and tuned models

mod entity;

pub use entity::{
    parse_timestamp, HyperparameterGrid, HyperparameterValue, TuneResponse, TunedModel,
    TunedModelId, TuningRequest, TuningResult, TuningStatus, TuningStatusResponse, TuningTask,
    TuningTaskId,
};
