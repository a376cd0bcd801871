//! Batch prediction: spreadsheet parsing, chunked runs and export

mod error;
mod outcome;
mod progress;
mod runner;
mod table;

pub use error::BatchError;
pub use outcome::{BatchOutcome, CONFIDENCE_COLUMN, PREDICTED_CLASS_COLUMN};
pub use progress::{chunk_count, BatchProgress};
pub use runner::{BatchRunner, DEFAULT_CHUNK_SIZE};
pub use table::BatchTable;
