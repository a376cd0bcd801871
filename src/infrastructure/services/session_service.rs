//! Session service - anonymous form sessions

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::domain::{
    DocumentStore, DomainError, FeatureVector, FieldInput, PredictionResult, Schema, Session,
    SessionId,
};

#[derive(Debug)]
pub struct SessionService {
    store: Arc<dyn DocumentStore<Session>>,
}

impl SessionService {
    pub fn new(store: Arc<dyn DocumentStore<Session>>) -> Self {
        Self { store }
    }

    fn parse_id(&self, id: &str) -> Result<SessionId, DomainError> {
        SessionId::new(id)
    }

    #[instrument(skip(self))]
    pub async fn create(&self, schema: Schema) -> Result<Session, DomainError> {
        let session = self.store.insert(Session::new(schema)).await?;
        info!(session_id = %session.id(), "Created session");
        Ok(session)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Session, DomainError> {
        let session_id = self.parse_id(id)?;

        self.store
            .get(&session_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Session '{}' not found", id)))
    }

    /// Switch the form to another schema; a real change resets values and prediction
    #[instrument(skip(self))]
    pub async fn switch_schema(&self, id: &str, schema: Schema) -> Result<Session, DomainError> {
        let mut session = self.get(id).await?;

        if session.switch_schema(schema) {
            debug!(session_id = %id, %schema, "Form reset for new schema");
        }

        self.store.replace(session).await
    }

    /// Store the submitted values and the prediction they produced
    #[instrument(skip(self, values, prediction))]
    pub async fn record_prediction(
        &self,
        id: &str,
        schema: Schema,
        values: &BTreeMap<String, FieldInput>,
        prediction: PredictionResult,
    ) -> Result<Session, DomainError> {
        let mut session = self.get(id).await?;
        session.switch_schema(schema);

        for (name, value) in values {
            session.form_mut().set_value(name, value.clone())?;
        }

        session.record_prediction(prediction);
        self.store.replace(session).await
    }

    /// Drop the last prediction after a failed submission
    #[instrument(skip(self))]
    pub async fn clear_prediction(&self, id: &str) -> Result<Session, DomainError> {
        let mut session = self.get(id).await?;
        session.touch();
        session.form_mut().clear_prediction();
        self.store.replace(session).await
    }

    /// Put generated values into the form
    #[instrument(skip(self, vector))]
    pub async fn fill(&self, id: &str, vector: &FeatureVector) -> Result<Session, DomainError> {
        let mut session = self.get(id).await?;
        session.switch_schema(vector.schema());
        session.form_mut().fill(vector)?;
        session.form_mut().clear_prediction();
        self.store.replace(session).await
    }

    pub async fn count(&self) -> Result<usize, DomainError> {
        self.store.count().await
    }
}
