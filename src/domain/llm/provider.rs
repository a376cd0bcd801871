use std::fmt::Debug;

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse};
use crate::domain::DomainError;

/// Generative text API (OpenAI-compatible chat completions)
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    async fn complete(
        &self,
        model: &str,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, DomainError>;

    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use std::sync::Mutex;

    use super::*;

    /// Returns a canned completion and remembers the last request
    #[derive(Debug, Default)]
    pub struct MockLlmProvider {
        content: Option<String>,
        error: Option<String>,
        last_request: Mutex<Option<CompletionRequest>>,
    }

    impl MockLlmProvider {
        pub fn with_content(content: impl Into<String>) -> Self {
            Self {
                content: Some(content.into()),
                ..Default::default()
            }
        }

        pub fn with_error(error: impl Into<String>) -> Self {
            Self {
                error: Some(error.into()),
                ..Default::default()
            }
        }

        pub fn last_request(&self) -> Option<CompletionRequest> {
            self.last_request.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn complete(
            &self,
            model: &str,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, DomainError> {
            *self.last_request.lock().unwrap() = Some(request);

            if let Some(ref error) = self.error {
                return Err(DomainError::provider("mock", error));
            }

            let content = self
                .content
                .clone()
                .ok_or_else(|| DomainError::provider("mock", "No mock response configured"))?;

            Ok(CompletionResponse::new("mock-1", model, content))
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }
    }
}
