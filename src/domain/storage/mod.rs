//! Document storage abstraction for sessions and tuned-model metadata

mod document;
mod store;

pub use document::{Document, DocumentKey};
pub use store::DocumentStore;
