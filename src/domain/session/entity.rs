use std::fmt;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::features::FormState;
use crate::domain::prediction::PredictionResult;
use crate::domain::schema::Schema;
use crate::domain::storage::{Document, DocumentKey};
use crate::domain::DomainError;

/// Regex pattern for valid session IDs: sess-{uuid}
static ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^sess-[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}$")
        .expect("valid regex")
});

/// Identifier handed to an anonymous browser
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();

        if !ID_PATTERN.is_match(&id) {
            return Err(DomainError::invalid_id(format!(
                "Invalid session ID '{}': must be in format sess-{{uuid}}",
                id
            )));
        }

        Ok(Self(id))
    }

    pub fn generate() -> Self {
        Self(format!("sess-{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl DocumentKey for SessionId {
    fn as_str(&self) -> &str {
        &self.0
    }
}

/// Anonymous session with the form the user is working on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    form: FormState,
    #[serde(default)]
    prediction_count: u64,
    created_at: DateTime<Utc>,
    last_seen_at: DateTime<Utc>,
}

impl Session {
    pub fn new(schema: Schema) -> Self {
        let now = Utc::now();

        Self {
            id: SessionId::generate(),
            form: FormState::new(schema),
            prediction_count: 0,
            created_at: now,
            last_seen_at: now,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.form
    }

    pub fn prediction_count(&self) -> u64 {
        self.prediction_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_seen_at(&self) -> DateTime<Utc> {
        self.last_seen_at
    }

    pub fn touch(&mut self) {
        self.last_seen_at = Utc::now();
    }

    pub fn switch_schema(&mut self, schema: Schema) -> bool {
        self.touch();
        self.form.switch_schema(schema)
    }

    pub fn record_prediction(&mut self, prediction: PredictionResult) {
        self.touch();
        self.prediction_count += 1;
        self.form.record_prediction(prediction);
    }
}

impl Document for Session {
    type Key = SessionId;

    const COLLECTION: &'static str = "sessions";

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_id_is_valid() {
        let id = SessionId::generate();
        assert!(SessionId::new(id.as_str()).is_ok());
    }

    #[test]
    fn test_invalid_id() {
        assert!(SessionId::new("sess-123").is_err());
        assert!(SessionId::new("").is_err());
    }

    #[test]
    fn test_record_prediction_counts() {
        let mut session = Session::new(Schema::Kepler);
        session.record_prediction(PredictionResult::new("CONFIRMED", 0.9));
        session.record_prediction(PredictionResult::new("CANDIDATE", 0.6));

        assert_eq!(session.prediction_count(), 2);
        assert_eq!(session.form().prediction().unwrap().prediction, "CANDIDATE");
        assert!(session.last_seen_at() >= session.created_at());
    }

    #[test]
    fn test_switch_schema_clears_prediction() {
        let mut session = Session::new(Schema::Kepler);
        session.record_prediction(PredictionResult::new("CONFIRMED", 0.9));

        assert!(session.switch_schema(Schema::Tess));
        assert!(session.form().prediction().is_none());
        assert_eq!(session.prediction_count(), 1);
    }

    #[test]
    fn test_serde_round_trip() {
        let session = Session::new(Schema::Tess);
        let json = serde_json::to_value(&session).unwrap();
        let restored: Session = serde_json::from_value(json).unwrap();
        assert_eq!(restored, session);
    }
}
