use serde::{Deserialize, Serialize};

use super::{FieldErrorKind, ValidationErrors};
use crate::domain::schema::Schema;

/// Validated, ordered model input for one schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    schema: Schema,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Build a vector from values already in schema field order
    pub fn new(schema: Schema, values: Vec<f64>) -> Result<Self, ValidationErrors> {
        let fields = schema.fields();

        if values.len() != fields.len() {
            return Err(ValidationErrors::general(format!(
                "{} expects {} features, got {}",
                schema.display_name(),
                fields.len(),
                values.len()
            )));
        }

        let mut errors = ValidationErrors::new();

        for (field, value) in fields.iter().zip(&values) {
            if !value.is_finite() {
                errors.push_field(field, FieldErrorKind::NotNumeric);
            } else if *value <= 0.0 {
                errors.push_field(field, FieldErrorKind::NotPositive);
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self { schema, values })
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.schema
            .fields()
            .iter()
            .position(|f| f.name == name)
            .map(|idx| self.values[idx])
    }

    /// (field name, value) pairs in schema order
    pub fn named_values(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name)
            .zip(self.values.iter().copied())
    }
}
