use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Failed to read city table '{0}'")]
    Read(PathBuf, #[source] PolarsError),

    #[error("City table '{path}' has no '{column}' column")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Failed processing city table '{path}': {source}")]
    Frame {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("City table '{path}' has {rows} rows but {values} coordinates were supplied")]
    LengthMismatch {
        path: PathBuf,
        rows: usize,
        values: usize,
    },

    #[error("I/O error writing city table '{0}'")]
    WriteIo(PathBuf, #[source] std::io::Error),

    #[error("Encoding error writing city table '{0}'")]
    WritePolars(PathBuf, #[source] PolarsError),
}
