//! Infrastructure layer - External service implementations

pub mod classifier;
pub mod http_client;
pub mod llm;
pub mod logging;
pub mod observability;
pub mod services;
pub mod storage;
