// Load errors - the only fatal failure in the dashboard
// Empty filter results are NOT errors, see aggregate::Summary

use std::path::PathBuf;
use thiserror::Error;

pub type LoadResult<T> = Result<T, LoadError>;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read sales data from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sales data is not valid {0}")]
    Encoding(&'static str),

    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("required column missing from header: {0}")]
    MissingColumn(String),

    #[error("malformed record at line {line}: {message}")]
    Malformed { line: u64, message: String },
}
