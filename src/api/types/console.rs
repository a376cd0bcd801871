//! Request and response bodies of the console endpoints

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{
    FeatureVector, FieldInput, FieldSpec, HyperparameterGrid, PredictionResult, Schema,
    TuneResponse, TunedModel, TuningResult,
};
use crate::infrastructure::services::PredictionOutcome;

#[derive(Debug, Clone, Serialize)]
pub struct SchemaInfo {
    pub name: Schema,
    pub display_name: &'static str,
    pub fields: &'static [FieldSpec],
    pub classes: &'static [&'static str],
}

impl From<Schema> for SchemaInfo {
    fn from(schema: Schema) -> Self {
        Self {
            name: schema,
            display_name: schema.display_name(),
            fields: schema.fields(),
            classes: schema.known_classes(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemasResponse {
    pub schemas: Vec<SchemaInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub schema: Option<Schema>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwitchSchemaRequest {
    pub schema: Schema,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictBody {
    pub schema: Schema,
    #[serde(default)]
    pub values: BTreeMap<String, FieldInput>,
    #[serde(default)]
    pub tuned_model: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassProbability {
    pub class: String,
    pub probability: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictResponse {
    pub prediction: String,
    pub confidence: f64,
    pub confidence_percent: f64,
    /// Most likely class first
    pub probabilities: Vec<ClassProbability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub features: FeatureVector,
}

impl From<PredictionOutcome> for PredictResponse {
    fn from(outcome: PredictionOutcome) -> Self {
        let PredictionOutcome { features, result } = outcome;
        let probabilities = ranked(&result);

        Self {
            confidence_percent: result.confidence_percent(),
            prediction: result.prediction,
            confidence: result.confidence,
            probabilities,
            model: result.model,
            features,
        }
    }
}

fn ranked(result: &PredictionResult) -> Vec<ClassProbability> {
    result
        .ranked_probabilities()
        .into_iter()
        .map(|(class, probability)| ClassProbability {
            class: class.to_string(),
            probability,
        })
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExplainBody {
    pub schema: Schema,
    pub values: BTreeMap<String, FieldInput>,
    pub prediction: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExplainResponse {
    pub explanation: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateBody {
    pub schema: Schema,
    #[serde(default)]
    pub hint: Option<String>,
    /// When present, the generated values are written into this session's form
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
    pub schema: Schema,
    pub values: BTreeMap<&'static str, f64>,
}

impl From<FeatureVector> for GenerateResponse {
    fn from(vector: FeatureVector) -> Self {
        Self {
            schema: vector.schema(),
            values: vector.named_values().collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TuneBody {
    pub schema: Schema,
    #[serde(default)]
    pub hyperparameters: HyperparameterGrid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TuneSubmitResponse {
    Queued { task_id: String },
    Completed { result: TuningResult },
}

impl From<TuneResponse> for TuneSubmitResponse {
    fn from(response: TuneResponse) -> Self {
        match response {
            TuneResponse::Queued { task_id } => Self::Queued {
                task_id: task_id.to_string(),
            },
            TuneResponse::Completed(result) => Self::Completed { result },
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TunedModelsQuery {
    /// Serve the local mirror instead of asking the backend
    #[serde(default)]
    pub cached: bool,
    #[serde(default)]
    pub schema: Option<Schema>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TunedModelsResponse {
    pub models: Vec<TunedModel>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportQuery {
    /// Comma separated column names, in output order
    #[serde(default)]
    pub columns: Option<String>,
}

impl ExportQuery {
    pub fn column_list(&self) -> Option<Vec<String>> {
        let columns: Vec<String> = self
            .columns
            .as_deref()?
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();

        (!columns.is_empty()).then_some(columns)
    }
}
