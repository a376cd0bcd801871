//! Explanation service - AI explanations and generated sample values

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument};

use crate::domain::explanation::{
    clean_paragraph, explanation_request, parse_sample, sample_request, ExplanationInput,
};
use crate::domain::{CompletionRequest, CompletionResponse, DomainError, FeatureVector, LlmProvider, Schema};
use crate::infrastructure::observability::{record_llm_request, LlmRequestMetricParams};

#[derive(Debug)]
pub struct ExplanationService {
    provider: Option<Arc<dyn LlmProvider>>,
    model: String,
}

impl ExplanationService {
    pub fn new(provider: Option<Arc<dyn LlmProvider>>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        purpose: &str,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, DomainError> {
        let provider = self.provider.as_ref().ok_or_else(|| {
            DomainError::configuration("AI features are disabled: no completion API key configured")
        })?;

        let started = Instant::now();
        let result = provider.complete(&self.model, request).await;
        let usage = result.as_ref().ok().and_then(|r| r.usage);

        record_llm_request(LlmRequestMetricParams {
            provider: provider.provider_name(),
            model: &self.model,
            purpose,
            duration: started.elapsed(),
            success: result.is_ok(),
            input_tokens: usage.map(|u| u64::from(u.prompt_tokens)),
            output_tokens: usage.map(|u| u64::from(u.completion_tokens)),
        });

        result
    }

    /// One paragraph explaining a prediction
    #[instrument(skip(self, input), fields(schema = %input.schema(), prediction = %input.prediction))]
    pub async fn explain(&self, input: &ExplanationInput) -> Result<String, DomainError> {
        let response = self.complete("explain", explanation_request(input)).await?;
        let paragraph = clean_paragraph(&response.content)?;

        info!(chars = paragraph.len(), "Explanation generated");
        Ok(paragraph)
    }

    /// Plausible values for every field of `schema`, already validated
    #[instrument(skip(self))]
    pub async fn generate_sample(
        &self,
        schema: Schema,
        hint: Option<&str>,
    ) -> Result<FeatureVector, DomainError> {
        let response = self.complete("generate", sample_request(schema, hint)).await?;
        let vector = parse_sample(schema, &response.content)?;

        info!("Sample values generated");
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::MockLlmProvider;

    fn input() -> ExplanationInput {
        ExplanationInput {
            features: FeatureVector::new(Schema::Kepler, vec![2.0; 13]).unwrap(),
            prediction: "CONFIRMED".to_string(),
            confidence: 0.93,
        }
    }

    #[tokio::test]
    async fn test_explain_returns_single_paragraph() {
        let provider = Arc::new(MockLlmProvider::with_content(
            "The signal-to-noise ratio is high.\n\nThe radius is planetary.",
        ));
        let service = ExplanationService::new(Some(provider.clone()), "gpt-4o-mini");

        let text = service.explain(&input()).await.unwrap();
        assert_eq!(text, "The signal-to-noise ratio is high. The radius is planetary.");

        let request = provider.last_request().unwrap();
        assert!(request.messages[1].content.contains("CONFIRMED"));
    }

    #[tokio::test]
    async fn test_generate_sample_validates_values() {
        let body: Vec<String> = Schema::Kepler
            .field_names()
            .iter()
            .map(|n| format!("\"{}\": 12.5", n))
            .collect();
        let provider = Arc::new(MockLlmProvider::with_content(format!("{{{}}}", body.join(","))));
        let service = ExplanationService::new(Some(provider), "gpt-4o-mini");

        let vector = service.generate_sample(Schema::Kepler, None).await.unwrap();
        assert_eq!(vector.values().len(), 13);

        let provider = Arc::new(MockLlmProvider::with_content(r#"{"koi_period": -3}"#));
        let service = ExplanationService::new(Some(provider), "gpt-4o-mini");
        assert!(matches!(
            service.generate_sample(Schema::Kepler, None).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_disabled_without_provider() {
        let service = ExplanationService::new(None, "gpt-4o-mini");

        assert!(!service.is_enabled());
        assert!(matches!(
            service.explain(&input()).await,
            Err(DomainError::Configuration { .. })
        ));
    }

    #[tokio::test]
    async fn test_provider_error_is_returned() {
        let provider = Arc::new(MockLlmProvider::with_error("rate limited"));
        let service = ExplanationService::new(Some(provider), "gpt-4o-mini");

        assert!(matches!(
            service.explain(&input()).await,
            Err(DomainError::Provider { .. })
        ));
    }
}
