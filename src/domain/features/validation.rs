use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::FeatureVector;
use crate::domain::schema::{FieldSpec, Schema};

/// Raw value entered for a field: the form may send text or numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldInput {
    Number(f64),
    Text(String),
}

impl FieldInput {
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(s) if s.trim().is_empty())
    }
}

impl From<f64> for FieldInput {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for FieldInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Why a single field was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    Required,
    NotNumeric,
    NotPositive,
    UnknownField,
}

/// Inline error attached to a form field (or to the whole form when `field` is None)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FieldErrorKind>,
    pub message: String,
}

/// All validation failures of one submission
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError {
                field: None,
                kind: None,
                message: message.into(),
            }],
        }
    }

    pub fn push_field(&mut self, field: &FieldSpec, kind: FieldErrorKind) {
        let message = match kind {
            FieldErrorKind::Required => format!("{} is required", field.label),
            FieldErrorKind::NotNumeric => format!("{} must be a number", field.label),
            FieldErrorKind::NotPositive => format!("{} must be a positive number", field.label),
            FieldErrorKind::UnknownField => format!("{} is not part of this schema", field.name),
        };

        self.errors.push(FieldError {
            field: Some(field.name.to_string()),
            kind: Some(kind),
            message,
        });
    }

    pub fn push_unknown(&mut self, name: &str, schema: Schema) {
        self.errors.push(FieldError {
            field: Some(name.to_string()),
            kind: Some(FieldErrorKind::UnknownField),
            message: format!(
                "'{}' is not a {} field",
                name,
                schema.display_name()
            ),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn for_field(&self, name: &str) -> Option<&FieldError> {
        self.errors
            .iter()
            .find(|e| e.field.as_deref() == Some(name))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Parse and check a single field value: required, numeric, finite and > 0
pub fn validate_value(input: Option<&FieldInput>) -> Result<f64, FieldErrorKind> {
    let value = match input {
        None => return Err(FieldErrorKind::Required),
        Some(input) if input.is_blank() => return Err(FieldErrorKind::Required),
        Some(FieldInput::Number(n)) => *n,
        Some(FieldInput::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| FieldErrorKind::NotNumeric)?,
    };

    if !value.is_finite() {
        return Err(FieldErrorKind::NotNumeric);
    }

    if value <= 0.0 {
        return Err(FieldErrorKind::NotPositive);
    }

    Ok(value)
}

/// Validate a whole form for `schema`, collecting every field error
pub fn validate_form(
    schema: Schema,
    values: &BTreeMap<String, FieldInput>,
) -> Result<FeatureVector, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    for name in values.keys() {
        if schema.field(name).is_none() {
            errors.push_unknown(name, schema);
        }
    }

    let mut parsed = Vec::with_capacity(schema.fields().len());

    for field in schema.fields() {
        match validate_value(values.get(field.name)) {
            Ok(value) => parsed.push(value),
            Err(kind) => errors.push_field(field, kind),
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    FeatureVector::new(schema, parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_tess_form() -> BTreeMap<String, FieldInput> {
        Schema::Tess
            .field_names()
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), FieldInput::Number(i as f64 + 1.0)))
            .collect()
    }

    #[test]
    fn test_validate_value() {
        assert_eq!(validate_value(Some(&FieldInput::from(" 3.5 "))), Ok(3.5));
        assert_eq!(validate_value(Some(&FieldInput::from(2.0))), Ok(2.0));
        assert_eq!(validate_value(None), Err(FieldErrorKind::Required));
        assert_eq!(
            validate_value(Some(&FieldInput::from("  "))),
            Err(FieldErrorKind::Required)
        );
        assert_eq!(
            validate_value(Some(&FieldInput::from("abc"))),
            Err(FieldErrorKind::NotNumeric)
        );
        assert_eq!(
            validate_value(Some(&FieldInput::from("NaN"))),
            Err(FieldErrorKind::NotNumeric)
        );
        assert_eq!(
            validate_value(Some(&FieldInput::from(0.0))),
            Err(FieldErrorKind::NotPositive)
        );
        assert_eq!(
            validate_value(Some(&FieldInput::from("-4"))),
            Err(FieldErrorKind::NotPositive)
        );
    }

    #[test]
    fn test_validate_form_success_keeps_schema_order() {
        let vector = validate_form(Schema::Tess, &complete_tess_form()).unwrap();
        assert_eq!(vector.schema(), Schema::Tess);
        assert_eq!(vector.values().len(), 11);
        assert_eq!(vector.values()[0], 1.0);
        assert_eq!(vector.get("st_rad"), Some(11.0));
    }

    #[test]
    fn test_validate_form_collects_every_error() {
        let mut form = complete_tess_form();
        form.remove("pl_rade");
        form.insert("pl_eqt".to_string(), FieldInput::from("hot"));
        form.insert("st_dist".to_string(), FieldInput::from(-1.0));

        let errors = validate_form(Schema::Tess, &form).unwrap_err();

        assert_eq!(errors.len(), 3);
        assert_eq!(
            errors.for_field("pl_rade").unwrap().kind,
            Some(FieldErrorKind::Required)
        );
        assert_eq!(
            errors.for_field("pl_eqt").unwrap().kind,
            Some(FieldErrorKind::NotNumeric)
        );
        assert_eq!(
            errors.for_field("st_dist").unwrap().message,
            "Stellar Distance must be a positive number"
        );
    }

    #[test]
    fn test_validate_form_rejects_foreign_fields() {
        let mut form = complete_tess_form();
        form.insert("koi_period".to_string(), FieldInput::from(1.0));

        let errors = validate_form(Schema::Tess, &form).unwrap_err();
        assert_eq!(
            errors.for_field("koi_period").unwrap().kind,
            Some(FieldErrorKind::UnknownField)
        );
    }

    #[test]
    fn test_field_input_deserializes_numbers_and_text() {
        let form: BTreeMap<String, FieldInput> =
            serde_json::from_str(r#"{"a": 1.5, "b": "2.5"}"#).unwrap();
        assert_eq!(form["a"], FieldInput::Number(1.5));
        assert_eq!(form["b"], FieldInput::Text("2.5".to_string()));
    }
}
