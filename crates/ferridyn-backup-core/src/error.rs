//! Error types for the backup pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Boxed backend error carried by [`ListError`] and [`ScanPageError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Listing the tables failed. Fatal for the whole run.
#[derive(Debug, Error)]
#[error("failed to list tables: {source}")]
pub struct ListError {
    #[source]
    pub source: BoxError,
}

impl ListError {
    pub fn new(source: impl Into<BoxError>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// One page of a table scan failed. Pages fetched before it stay valid.
#[derive(Debug, Error)]
#[error("scan of table '{table}' failed on page {page}: {source}")]
pub struct ScanPageError {
    pub table: String,
    /// 1-based number of the page that failed.
    pub page: usize,
    #[source]
    pub source: BoxError,
}

impl ScanPageError {
    pub fn new(table: &str, page: usize, source: impl Into<BoxError>) -> Self {
        Self {
            table: table.to_string(),
            page,
            source: source.into(),
        }
    }
}

/// Persisting a snapshot failed.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("table name cannot be used as a file name: {0:?}")]
    InvalidTableName(String),

    #[error("snapshot already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WriteError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
