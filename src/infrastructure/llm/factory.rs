use std::sync::Arc;
use std::time::Duration;

use super::openai::OpenAiProvider;
use crate::domain::{DomainError, LlmProvider};
use crate::infrastructure::http_client::HttpClient;

/// Factory for creating LLM providers
#[derive(Debug)]
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Create an OpenAI-compatible provider; a missing key disables AI features
    pub fn create_openai(
        api_key: Option<&str>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Option<Arc<dyn LlmProvider>>, DomainError> {
        let Some(api_key) = api_key.map(str::trim).filter(|k| !k.is_empty()) else {
            return Ok(None);
        };

        let client = HttpClient::with_timeout(timeout)?;
        Ok(Some(Arc::new(OpenAiProvider::with_base_url(
            client, api_key, base_url,
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_openai_provider() {
        let provider = LlmProviderFactory::create_openai(
            Some("sk-test"),
            "https://api.openai.com",
            Duration::from_secs(30),
        )
        .unwrap()
        .unwrap();
        assert_eq!(provider.provider_name(), "openai");
    }

    #[test]
    fn test_blank_key_disables_provider() {
        let provider =
            LlmProviderFactory::create_openai(Some("  "), "http://llm", Duration::from_secs(5))
                .unwrap();
        assert!(provider.is_none());

        let provider =
            LlmProviderFactory::create_openai(None, "http://llm", Duration::from_secs(5)).unwrap();
        assert!(provider.is_none());
    }
}
