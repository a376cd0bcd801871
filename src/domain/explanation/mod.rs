//! Prompts and response parsing for AI explanations and generated samples

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::features::{validate_form, FeatureVector, FieldInput};
use crate::domain::llm::CompletionRequest;
use crate::domain::schema::Schema;
use crate::domain::DomainError;

const EXPLANATION_SYSTEM: &str = "You are an astrophysicist who explains exoplanet \
classifications to curious non-experts. Answer with one short paragraph of plain text.";

const SAMPLE_SYSTEM: &str = "You generate realistic measurement values for exoplanet \
candidates. Answer with a single JSON object that maps every requested field name to a \
positive number and nothing else.";

/// What the explanation is about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationInput {
    pub features: FeatureVector,
    pub prediction: String,
    pub confidence: f64,
}

impl ExplanationInput {
    pub fn schema(&self) -> Schema {
        self.features.schema()
    }
}

pub fn explanation_request(input: &ExplanationInput) -> CompletionRequest {
    let schema = input.schema();

    let mut measurements = String::new();
    for (name, value) in input.features.named_values() {
        let label = schema.field(name).map(|f| (f.label, f.unit));
        match label {
            Some((label, unit)) if !unit.is_empty() => {
                measurements.push_str(&format!("- {} ({}): {} {}\n", label, name, value, unit))
            }
            Some((label, _)) => measurements.push_str(&format!("- {} ({}): {}\n", label, name, value)),
            None => measurements.push_str(&format!("- {}: {}\n", name, value)),
        }
    }

    let prompt = format!(
        "A {} model classified an object as \"{}\" with {:.1}% confidence.\n\
         Measurements:\n{}\n\
         Explain which measurements most likely drove this result and what the \
         confidence level means.",
        schema.display_name(),
        input.prediction,
        input.confidence * 100.0,
        measurements
    );

    CompletionRequest::builder()
        .system(EXPLANATION_SYSTEM)
        .user(prompt)
        .temperature(0.4)
        .max_tokens(400)
        .build()
}

/// Collapse the completion into a single paragraph
pub fn clean_paragraph(content: &str) -> Result<String, DomainError> {
    let paragraph = content
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if paragraph.is_empty() {
        return Err(DomainError::provider("llm", "Empty explanation returned"));
    }

    Ok(paragraph)
}

pub fn sample_request(schema: Schema, hint: Option<&str>) -> CompletionRequest {
    let fields: Vec<String> = schema
        .fields()
        .iter()
        .map(|f| {
            if f.unit.is_empty() {
                format!("- {}: {}", f.name, f.label)
            } else {
                format!("- {}: {} in {}", f.name, f.label, f.unit)
            }
        })
        .collect();

    let mut prompt = format!(
        "Generate one plausible {} object of interest with these fields:\n{}",
        schema.display_name(),
        fields.join("\n")
    );

    if let Some(hint) = hint.map(str::trim).filter(|h| !h.is_empty()) {
        prompt.push_str(&format!("\nThe object should resemble: {}", hint));
    }

    CompletionRequest::builder()
        .system(SAMPLE_SYSTEM)
        .user(prompt)
        .temperature(0.9)
        .json_object()
        .build()
}

/// Parse a generated sample and run it through the form validator
pub fn parse_sample(schema: Schema, content: &str) -> Result<FeatureVector, DomainError> {
    let json = strip_code_fence(content);

    let object: BTreeMap<String, Value> = serde_json::from_str(json).map_err(|e| {
        DomainError::provider("llm", format!("Generated sample is not a JSON object: {}", e))
    })?;

    let values: BTreeMap<String, FieldInput> = object
        .into_iter()
        .filter(|(name, _)| schema.field(name).is_some())
        .filter_map(|(name, value)| match value {
            Value::Number(n) => n.as_f64().map(|v| (name, FieldInput::Number(v))),
            Value::String(s) => Some((name, FieldInput::Text(s))),
            _ => None,
        })
        .collect();

    Ok(validate_form(schema, &values)?)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();

    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}
