//! Tuning domain entities

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::schema::Schema;
use crate::domain::storage::{Document, DocumentKey};
use crate::domain::DomainError;

/// Tuned model ids are document ids of the model store: 24 hex characters
static TUNED_MODEL_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{24}$").expect("valid regex"));

/// Task ids are opaque queue identifiers; only path-safe characters are accepted
static TASK_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,128}$").expect("valid regex"));

/// Identifier of a model produced by a tuning run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TunedModelId(String);

impl TunedModelId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();

        if !TUNED_MODEL_ID_PATTERN.is_match(&id) {
            return Err(DomainError::invalid_id(format!(
                "Invalid tuned model ID '{}': expected 24 hexadecimal characters",
                id
            )));
        }

        Ok(Self(id.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TunedModelId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TunedModelId> for String {
    fn from(id: TunedModelId) -> Self {
        id.0
    }
}

impl fmt::Display for TunedModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl DocumentKey for TunedModelId {
    fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier of a background tuning task
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TuningTaskId(String);

impl TuningTaskId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();

        if !TASK_ID_PATTERN.is_match(&id) {
            return Err(DomainError::invalid_id(format!("Invalid tuning task ID '{}'", id)));
        }

        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TuningTaskId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TuningTaskId> for String {
    fn from(id: TuningTaskId) -> Self {
        id.0
    }
}

impl fmt::Display for TuningTaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One candidate value of a hyperparameter. Integers stay integers on the
/// wire so estimators that require them (e.g. `n_estimators`) accept the grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HyperparameterValue {
    Integer(i64),
    Float(f64),
}

impl HyperparameterValue {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let raw = raw.trim();

        if let Ok(int) = raw.parse::<i64>() {
            return Ok(Self::Integer(int));
        }

        match raw.parse::<f64>() {
            Ok(float) if float.is_finite() => Ok(Self::Float(float)),
            _ => Err(DomainError::validation(format!(
                "Hyperparameter value '{}' is not a number",
                raw
            ))),
        }
    }

    fn is_finite(&self) -> bool {
        match self {
            Self::Integer(_) => true,
            Self::Float(f) => f.is_finite(),
        }
    }
}

impl fmt::Display for HyperparameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
        }
    }
}

/// Search grid: parameter name to the candidate values to try
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HyperparameterGrid(BTreeMap<String, Vec<HyperparameterValue>>);

impl HyperparameterGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_param(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = HyperparameterValue>,
    ) -> Self {
        self.0.insert(name.into(), values.into_iter().collect());
        self
    }

    /// Parse a `name=v1,v2,...` argument and add it to the grid
    pub fn add_spec(&mut self, spec: &str) -> Result<(), DomainError> {
        let (name, values) = spec.split_once('=').ok_or_else(|| {
            DomainError::validation(format!(
                "Hyperparameter '{}' must look like name=v1,v2",
                spec
            ))
        })?;

        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("Hyperparameter name cannot be empty"));
        }

        let values = values
            .split(',')
            .filter(|v| !v.trim().is_empty())
            .map(HyperparameterValue::parse)
            .collect::<Result<Vec<_>, _>>()?;

        self.0.insert(name.to_string(), values);
        Ok(())
    }

    pub fn params(&self) -> &BTreeMap<String, Vec<HyperparameterValue>> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of candidate combinations the backend will fit
    pub fn combinations(&self) -> usize {
        self.0.values().map(Vec::len).product()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.0.is_empty() {
            return Err(DomainError::validation("Missing hyperparameters for tuning"));
        }

        for (name, values) in &self.0 {
            if values.is_empty() {
                return Err(DomainError::validation(format!(
                    "Hyperparameter '{}' needs at least one value",
                    name
                )));
            }

            if values.iter().any(|v| !v.is_finite()) {
                return Err(DomainError::validation(format!(
                    "Hyperparameter '{}' contains a non-finite value",
                    name
                )));
            }
        }

        Ok(())
    }
}

/// Body of `POST /tune_model`
#[derive(Debug, Clone, Serialize)]
pub struct TuningRequest {
    pub model: String,
    pub hyperparameters: HyperparameterGrid,
}

impl TuningRequest {
    pub fn new(schema: Schema, hyperparameters: HyperparameterGrid) -> Result<Self, DomainError> {
        hyperparameters.validate()?;

        Ok(Self {
            model: schema.model_name().to_string(),
            hyperparameters,
        })
    }
}

/// Final outcome of a tuning run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub model_name: String,
    #[serde(default)]
    pub best_params: BTreeMap<String, Value>,
    pub accuracy: f64,
    /// Identifier of the stored model artifact
    pub model_id: String,
}

/// `POST /tune_model` answers either synchronously or with a task to poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TuneResponse {
    Queued { task_id: TuningTaskId },
    Completed(TuningResult),
}

/// Lifecycle of a background tuning task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum TuningStatus {
    #[default]
    #[serde(alias = "STARTED", alias = "RECEIVED", alias = "RETRY")]
    Pending,
    Success,
    Failure,
}

impl TuningStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }
}

impl fmt::Display for TuningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Success => write!(f, "SUCCESS"),
            Self::Failure => write!(f, "FAILURE"),
        }
    }
}

/// Body of `GET /tuning_status/{task_id}`
#[derive(Debug, Clone, Deserialize)]
pub struct TuningStatusResponse {
    pub status: TuningStatus,
    #[serde(default)]
    pub result: Option<TuningResult>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Client-side view of a background tuning task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TuningTask {
    pub task_id: TuningTaskId,
    pub status: TuningStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TuningResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TuningTask {
    pub fn pending(task_id: TuningTaskId) -> Self {
        Self {
            task_id,
            status: TuningStatus::Pending,
            result: None,
            error: None,
        }
    }

    pub fn from_status(task_id: TuningTaskId, response: TuningStatusResponse) -> Self {
        Self {
            task_id,
            status: response.status,
            result: response.result,
            error: response.error,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Metadata of a tuned model as listed by `GET /tuned_models`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTunedModel")]
pub struct TunedModel {
    #[serde(rename = "model_id")]
    pub id: TunedModelId,
    /// Base schema the model was tuned from
    pub model_name: String,
    #[serde(default)]
    pub hyperparameters: BTreeMap<String, Value>,
    pub accuracy: f64,
    pub created_at: DateTime<Utc>,
}

impl TunedModel {
    pub fn schema(&self) -> Option<Schema> {
        Schema::parse(&self.model_name).ok()
    }
}

impl Document for TunedModel {
    type Key = TunedModelId;

    const COLLECTION: &'static str = "tuned_models";

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

/// Listing documents carry both `_id` and `model_id`; stored copies only `model_id`
#[derive(Debug, Deserialize)]
struct RawTunedModel {
    #[serde(rename = "_id")]
    document_id: Option<String>,
    model_id: Option<String>,
    model_name: String,
    #[serde(default)]
    hyperparameters: BTreeMap<String, Value>,
    accuracy: f64,
    created_at: String,
}

impl TryFrom<RawTunedModel> for TunedModel {
    type Error = DomainError;

    fn try_from(raw: RawTunedModel) -> Result<Self, Self::Error> {
        let id = raw
            .document_id
            .or(raw.model_id)
            .ok_or_else(|| DomainError::invalid_id("Tuned model without an ID"))?;

        Ok(Self {
            id: TunedModelId::new(id)?,
            model_name: raw.model_name,
            hyperparameters: raw.hyperparameters,
            accuracy: raw.accuracy,
            created_at: parse_timestamp(&raw.created_at)?,
        })
    }
}

/// Accepts RFC 3339 and the RFC 2822 form Flask's JSON encoder emits
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DomainError> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DomainError::validation(format!("Invalid timestamp '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn test_tuned_model_id_validation() {
        assert!(TunedModelId::new("652F1C0A9B1E8A3D4C5B6A70").is_ok());
        assert!(TunedModelId::new("not-an-id").is_err());
        assert!(TunedModelId::new("").is_err());
    }

    #[test]
    fn test_task_id_validation() {
        assert!(TuningTaskId::new("0f3c8e0a-2b1d-4a5e-9f6b-7c8d9e0a1b2c").is_ok());
        assert!(TuningTaskId::new("../etc/passwd").is_err());
    }

    #[test]
    fn test_grid_parsing_keeps_integers() {
        let mut grid = HyperparameterGrid::new();
        grid.add_spec("classifier__xgb__n_estimators=100,200").unwrap();
        grid.add_spec("classifier__xgb__learning_rate=0.05, 0.1").unwrap();

        assert_eq!(grid.combinations(), 4);
        assert_eq!(
            serde_json::to_value(&grid).unwrap(),
            json!({
                "classifier__xgb__learning_rate": [0.05, 0.1],
                "classifier__xgb__n_estimators": [100, 200]
            })
        );
    }

    #[test]
    fn test_grid_validation() {
        assert!(HyperparameterGrid::new().validate().is_err());

        let grid = HyperparameterGrid::new().with_param("max_depth", vec![]);
        assert!(grid.validate().is_err());

        let mut bad = HyperparameterGrid::new();
        assert!(bad.add_spec("max_depth").is_err());
        assert!(bad.add_spec("max_depth=deep").is_err());
    }

    #[test]
    fn test_tune_response_variants() {
        let queued: TuneResponse = serde_json::from_value(json!({"task_id": "abc-123"})).unwrap();
        assert!(matches!(queued, TuneResponse::Queued { .. }));

        let completed: TuneResponse = serde_json::from_value(json!({
            "message": "Model tuned and saved successfully",
            "model_name": "kepler",
            "best_params": {"classifier__xgb__max_depth": 5},
            "accuracy": 0.91,
            "model_id": "652f1c0a9b1e8a3d4c5b6a70"
        }))
        .unwrap();

        match completed {
            TuneResponse::Completed(result) => {
                assert_eq!(result.accuracy, 0.91);
                assert_eq!(result.best_params["classifier__xgb__max_depth"], json!(5));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_status_parsing() {
        let response: TuningStatusResponse =
            serde_json::from_value(json!({"status": "STARTED"})).unwrap();
        assert_eq!(response.status, TuningStatus::Pending);

        let response: TuningStatusResponse =
            serde_json::from_value(json!({"status": "FAILURE", "error": "boom"})).unwrap();
        assert!(response.status.is_terminal());
        assert_eq!(response.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_tuned_model_from_listing() {
        let model: TunedModel = serde_json::from_value(json!({
            "_id": "652f1c0a9b1e8a3d4c5b6a70",
            "model_id": "652f1c0a9b1e8a3d4c5b6a70",
            "model_name": "tess",
            "hyperparameters": {"classifier__rf__n_estimators": 200},
            "accuracy": 0.88,
            "created_at": "Tue, 14 Oct 2025 10:30:00 GMT"
        }))
        .unwrap();

        assert_eq!(model.id.as_str(), "652f1c0a9b1e8a3d4c5b6a70");
        assert_eq!(model.schema(), Some(Schema::Tess));
        assert_eq!(model.created_at.month(), 10);
        assert_eq!(model.created_at.hour(), 10);
    }

    #[test]
    fn test_tuned_model_storage_round_trip() {
        let model: TunedModel = serde_json::from_value(json!({
            "model_id": "652f1c0a9b1e8a3d4c5b6a70",
            "model_name": "kepler",
            "accuracy": 0.9,
            "created_at": "2025-10-14T10:30:00Z"
        }))
        .unwrap();

        let stored = serde_json::to_value(&model).unwrap();
        let restored: TunedModel = serde_json::from_value(stored).unwrap();
        assert_eq!(restored, model);
    }
}
