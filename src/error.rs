//! Error taxonomy for the load pipeline.

use rusqlite::ErrorCode;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EtlError {
    /// A line failed to parse, or is missing a required field.
    #[error("Malformed record in {} line {line}: {reason}", path.display())]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A write hit a constraint outside the per-table conflict policy.
    #[error("Constraint violation writing {table}: {source}")]
    ConstraintViolation {
        table: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// The datastore is unusable. Aborts the whole batch.
    #[error("Database connection error: {0}")]
    Connection(#[source] rusqlite::Error),
}

impl EtlError {
    pub fn malformed(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        EtlError::MalformedRecord {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }

    /// Classifies a rusqlite failure raised while writing to `table`.
    pub fn from_write(table: &'static str, err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => EtlError::ConstraintViolation {
                table,
                source: err,
            },
            _ => EtlError::Connection(err),
        }
    }

    /// Fatal errors halt the batch; everything else only fails the current file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EtlError::Connection(_))
    }
}

impl From<rusqlite::Error> for EtlError {
    fn from(err: rusqlite::Error) -> Self {
        EtlError::Connection(err)
    }
}
