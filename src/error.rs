use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::BookField;

/// Failures the record store reports to its caller.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A new record left a required field blank. Nothing was changed.
    #[error("Please fill in the {0} field before adding the book.")]
    MissingField(BookField),

    #[error("failed to serialize library")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to write library file {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
