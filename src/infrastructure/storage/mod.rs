//! Document storage implementations

mod factory;
mod in_memory;
mod postgres;

pub use factory::{StorageConfig, StorageFactory, StorageType};
pub use in_memory::InMemoryStore;
pub use postgres::{PostgresConfig, PostgresStore};
