//! Error taxonomy for input loading and column resolution.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InputError {
    /// The file could not be read or parsed under any header layout.
    #[error("Failed to load {path}: {cause}")]
    DataLoad { path: String, cause: String },

    #[error("No data lines found in {path}")]
    EmptyTable { path: String },

    #[error("Column '{column}' not found in {path}")]
    ColumnNotFound { column: String, path: String },

    #[error("Cannot determine the response column in {path}")]
    ColumnResolution { path: String },

    #[error("No usable background columns in {path}")]
    NoBackgroundColumns { path: String },

    #[error("Column '{column}' row {row}: '{value}' is not numeric")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Column '{column}' row {row}: missing value")]
    MissingValue { column: String, row: usize },

    #[error("{path} must have at least {expected} columns, found {found}")]
    TooFewColumns {
        path: String,
        expected: usize,
        found: usize,
    },

    #[error(
        "Sample identifiers of {source_name} differ from {reference} at row {row}: \
         expected '{expected}', found '{found}'"
    )]
    SampleIdMismatch {
        reference: String,
        source_name: String,
        row: usize,
        expected: String,
        found: String,
    },
}

impl InputError {
    pub(crate) fn data_load(path: &std::path::Path, cause: impl std::fmt::Display) -> Self {
        InputError::DataLoad {
            path: path.display().to_string(),
            cause: cause.to_string(),
        }
    }
}
