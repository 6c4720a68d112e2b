//! Error types shared by extraction and output.

use crate::catalog::Backend;
use std::io;
use thiserror::Error;

/// Boxed transport error. Keeps driver types out of the public API.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The backend could not be reached or the connection could not be verified
    #[error("failed to connect to {backend}: {source}")]
    Connection {
        backend: Backend,
        #[source]
        source: BoxError,
    },

    /// Enumerating the catalog's tables failed
    #[error("failed to list tables: {source}")]
    TableListing {
        #[source]
        source: BoxError,
    },

    /// A metadata query for one table failed; the whole run is aborted
    #[error("failed to extract table {table}: {source}")]
    MetadataQuery {
        table: String,
        #[source]
        source: BoxError,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A document could not be created or written
    #[error("failed to write {target}: {source}")]
    Write {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("extraction cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::InvalidConfiguration(msg.into())
    }

    pub(crate) fn write(target: impl std::fmt::Display, source: io::Error) -> Self {
        Error::Write {
            target: target.to_string(),
            source,
        }
    }
}

/// A row did not have the shape an adapter expected
#[derive(Debug, Error)]
pub enum RowError {
    #[error("column {index} out of range (row has {len} columns)")]
    OutOfRange { index: usize, len: usize },

    #[error("column {index}: expected {expected}, found {found}")]
    Mismatch {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },
}
