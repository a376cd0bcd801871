//! Measurement schemas - the two fixed field sets a form can render

mod field;
mod definition;

pub use field::FieldSpec;
pub use definition::{Schema, UnknownSchema};
