use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{validate_form, FeatureVector, FieldInput, ValidationErrors};
use crate::domain::prediction::PredictionResult;
use crate::domain::schema::Schema;
use crate::domain::DomainError;

/// What one user currently has on screen: selected schema, entered values
/// and the last prediction rendered for them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    schema: Schema,
    #[serde(default)]
    values: BTreeMap<String, FieldInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prediction: Option<PredictionResult>,
}

impl FormState {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            values: BTreeMap::new(),
            prediction: None,
        }
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    pub fn values(&self) -> &BTreeMap<String, FieldInput> {
        &self.values
    }

    pub fn prediction(&self) -> Option<&PredictionResult> {
        self.prediction.as_ref()
    }

    /// Select another schema. Values are reset to the new field set and any
    /// prior prediction is dropped. Returns false when nothing changed.
    pub fn switch_schema(&mut self, schema: Schema) -> bool {
        if self.schema == schema {
            return false;
        }

        self.schema = schema;
        self.values.clear();
        self.prediction = None;
        true
    }

    pub fn set_value(&mut self, name: &str, input: FieldInput) -> Result<(), DomainError> {
        if self.schema.field(name).is_none() {
            let mut errors = ValidationErrors::new();
            errors.push_unknown(name, self.schema);
            return Err(errors.into());
        }

        self.values.insert(name.to_string(), input);
        Ok(())
    }

    /// Replace every value at once, e.g. with an AI-generated sample
    pub fn fill(&mut self, vector: &FeatureVector) -> Result<(), DomainError> {
        if vector.schema() != self.schema {
            return Err(DomainError::validation(format!(
                "Values are for {} but the form shows {}",
                vector.schema().display_name(),
                self.schema.display_name()
            )));
        }

        self.values = vector
            .named_values()
            .map(|(name, value)| (name.to_string(), FieldInput::Number(value)))
            .collect();
        Ok(())
    }

    pub fn validate(&self) -> Result<FeatureVector, ValidationErrors> {
        validate_form(self.schema, &self.values)
    }

    pub fn record_prediction(&mut self, prediction: PredictionResult) {
        self.prediction = Some(prediction);
    }

    pub fn clear_prediction(&mut self) {
        self.prediction = None;
    }
}
