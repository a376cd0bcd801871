//! Anonymous user sessions

mod entity;

pub use entity::{Session, SessionId};
