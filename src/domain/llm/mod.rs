//! Chat completion contract used for explanations and sample generation

mod completion;
mod provider;

pub use completion::{
    ChatMessage, ChatRole, CompletionRequest, CompletionRequestBuilder, CompletionResponse,
    ResponseFormat, TokenUsage,
};
pub use provider::LlmProvider;

#[cfg(test)]
pub use provider::mock::MockLlmProvider;
