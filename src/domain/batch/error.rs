use thiserror::Error;

use crate::domain::DomainError;

/// Why a batch upload was rejected or stopped
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BatchError {
    #[error("The uploaded file is empty")]
    EmptyFile,

    #[error("Missing required columns: {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("Invalid value '{value}' in column '{column}' at row {row}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Could not read the file: {0}")]
    Malformed(String),

    #[error("Error processing rows starting at row {offset}: {message}")]
    ChunkFailed { offset: usize, message: String },

    #[error("Unknown export columns: {}", .columns.join(", "))]
    UnknownExportColumns { columns: Vec<String> },
}

impl BatchError {
    /// File-format problems are detected before any row is sent
    pub fn is_file_format(&self) -> bool {
        matches!(
            self,
            Self::EmptyFile
                | Self::MissingColumns { .. }
                | Self::InvalidValue { .. }
                | Self::Malformed(_)
        )
    }
}

impl From<csv::Error> for BatchError {
    fn from(err: csv::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

impl From<BatchError> for DomainError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::ChunkFailed { .. } => DomainError::backend(err.to_string()),
            BatchError::UnknownExportColumns { .. } => DomainError::validation(err.to_string()),
            other => DomainError::file_format(other.to_string()),
        }
    }
}
