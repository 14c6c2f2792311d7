use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("Failed to create output directory '{0}'")]
    OutputDirCreation(PathBuf, #[source] std::io::Error),

    #[error("I/O error writing '{0}'")]
    WriteIo(PathBuf, #[source] std::io::Error),

    #[error("Failed to build table for '{0}'")]
    Frame(PathBuf, #[source] PolarsError),

    #[error("Encoding error writing CSV '{0}'")]
    CsvWrite(PathBuf, #[source] PolarsError),

    #[error("Failed to serialize records to JSON")]
    Json(#[from] serde_json::Error),
}
