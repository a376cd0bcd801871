//! Prediction results and targets

mod entity;

pub use entity::{PredictionResult, PredictionTarget};
