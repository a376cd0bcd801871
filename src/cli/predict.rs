//! Predict command - classify one set of measurements

use std::collections::BTreeMap;

use anyhow::Context;
use clap::Args;

use super::parse_assignment;
use crate::config::AppConfig;
use crate::domain::explanation::ExplanationInput;
use crate::domain::{DomainError, FieldInput, Schema};
use crate::infrastructure::services::{PredictRequest, PredictionOutcome};

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Measurement schema
    #[arg(long, default_value = "kepler")]
    pub schema: Schema,

    /// Field value; repeat once per field
    #[arg(long = "value", value_name = "NAME=VALUE")]
    pub values: Vec<String>,

    /// Ask the completion API for plausible values; explicit --value wins
    #[arg(long)]
    pub generate: bool,

    /// Extra instruction for --generate, e.g. "a hot Jupiter"
    #[arg(long, requires = "generate")]
    pub hint: Option<String>,

    /// Route the prediction to a tuned model
    #[arg(long, value_name = "MODEL_ID")]
    pub tuned_model: Option<String>,

    /// Print a natural-language explanation of the result
    #[arg(long)]
    pub explain: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

fn explicit_values(args: &PredictArgs) -> anyhow::Result<BTreeMap<String, FieldInput>> {
    args.values
        .iter()
        .map(|raw| {
            parse_assignment(raw)
                .map(|(name, value)| (name, FieldInput::Text(value)))
                .map_err(anyhow::Error::msg)
        })
        .collect()
}

pub async fn run(args: PredictArgs, config: AppConfig) -> anyhow::Result<()> {
    let state = crate::create_app_state_with_config(&config).await?;
    let mut values = BTreeMap::new();

    if args.generate {
        let sample = state
            .explanation_service
            .generate_sample(args.schema, args.hint.as_deref())
            .await
            .context("Could not generate sample values")?;

        values.extend(
            sample
                .named_values()
                .map(|(name, value)| (name.to_string(), FieldInput::Number(value))),
        );
    }

    values.extend(explicit_values(&args)?);

    let outcome = match state
        .prediction_service
        .predict(PredictRequest {
            schema: args.schema,
            values,
            tuned_model: args.tuned_model.clone(),
            session_id: None,
        })
        .await
    {
        Ok(outcome) => outcome,
        Err(DomainError::Validation(errors)) => {
            for error in errors.errors() {
                eprintln!("  {}", error.message);
            }
            anyhow::bail!("{} field(s) need attention", errors.len());
        }
        Err(e) => anyhow::bail!(e.user_message()),
    };

    let explanation = if args.explain {
        let input = ExplanationInput {
            features: outcome.features.clone(),
            prediction: outcome.result.prediction.clone(),
            confidence: outcome.result.confidence,
        };
        Some(
            state
                .explanation_service
                .explain(&input)
                .await
                .context("Could not generate an explanation")?,
        )
    } else {
        None
    };

    if args.json {
        let mut json = serde_json::to_value(&outcome)?;
        if let Some(ref text) = explanation {
            json["explanation"] = serde_json::Value::String(text.clone());
        }
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        print!("{}", render(&outcome));
        if let Some(text) = explanation {
            println!("\n{}", text);
        }
    }

    Ok(())
}

/// Human-readable result block
fn render(outcome: &PredictionOutcome) -> String {
    let result = &outcome.result;
    let mut out = format!(
        "{} prediction: {} ({:.1}% confidence)\n",
        outcome.features.schema().display_name(),
        result.prediction,
        result.confidence_percent()
    );

    for (label, probability) in result.ranked_probabilities() {
        out.push_str(&format!("  {:<16} {:>6.1}%\n", label, probability * 100.0));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FeatureVector, PredictionResult};

    #[test]
    fn test_render_lists_probabilities_most_likely_first() {
        let outcome = PredictionOutcome {
            features: FeatureVector::new(Schema::Kepler, vec![1.0; 13]).unwrap(),
            result: PredictionResult::new("CANDIDATE", 0.64)
                .with_probability("CONFIRMED", 0.3)
                .with_probability("CANDIDATE", 0.64)
                .with_probability("FALSE POSITIVE", 0.06),
        };

        let text = render(&outcome);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Kepler prediction: CANDIDATE (64.0% confidence)");
        assert!(lines[1].trim_start().starts_with("CANDIDATE"));
        assert!(lines[3].trim_start().starts_with("FALSE POSITIVE"));
    }

    #[test]
    fn test_explicit_values_are_text_inputs() {
        let args = PredictArgs {
            schema: Schema::Kepler,
            values: vec!["koi_period=9.48".to_string()],
            generate: false,
            hint: None,
            tuned_model: None,
            explain: false,
            json: false,
        };

        let values = explicit_values(&args).unwrap();
        assert_eq!(values["koi_period"], FieldInput::Text("9.48".to_string()));
    }
}
