use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::schema::Schema;
use crate::domain::tuning::TunedModelId;

/// Outcome of one classification call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted class label, e.g. `CONFIRMED`
    pub prediction: String,
    /// Probability of the predicted class, in [0, 1]
    pub confidence: f64,
    /// Probability per class label; expected to sum to ~1, not enforced
    #[serde(default)]
    pub probabilities: BTreeMap<String, f64>,
    /// Base model name echoed by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl PredictionResult {
    pub fn new(prediction: impl Into<String>, confidence: f64) -> Self {
        Self {
            prediction: prediction.into(),
            confidence,
            probabilities: BTreeMap::new(),
            model: None,
        }
    }

    pub fn with_probability(mut self, label: impl Into<String>, probability: f64) -> Self {
        self.probabilities.insert(label.into(), probability);
        self
    }

    pub fn confidence_percent(&self) -> f64 {
        (self.confidence * 100.0).clamp(0.0, 100.0)
    }

    /// Class probabilities, most likely first
    pub fn ranked_probabilities(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .probabilities
            .iter()
            .map(|(label, p)| (label.as_str(), *p))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

/// Which model a prediction is routed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictionTarget {
    /// Shipped model for a schema, served by `/predict`
    Base(Schema),
    /// Model produced by a tuning run, served by `/predict_tuned`
    Tuned(TunedModelId),
}

impl PredictionTarget {
    /// Value sent as `model` in the request body
    pub fn model_param(&self) -> &str {
        match self {
            Self::Base(schema) => schema.model_name(),
            Self::Tuned(id) => id.as_str(),
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Base(_) => "predict",
            Self::Tuned(_) => "predict_tuned",
        }
    }
}

impl fmt::Display for PredictionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base(schema) => write!(f, "base:{}", schema),
            Self::Tuned(id) => write!(f, "tuned:{}", id),
        }
    }
}
