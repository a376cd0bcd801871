//! Feature vectors, client-side validation and form state

mod form;
mod validation;
mod vector;

pub use form::FormState;
pub use validation::{
    validate_form, validate_value, FieldError, FieldErrorKind, FieldInput, ValidationErrors,
};
pub use vector::FeatureVector;
