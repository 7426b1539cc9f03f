//! Store error type.

use thiserror::Error;

/// Errors returned by a [`StoreClient`](crate::StoreClient).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached or answered with a server error.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A row came back in a shape that could not be normalized.
    #[error("malformed {entity} row: {reason}")]
    Malformed {
        entity: &'static str,
        reason: String,
    },

    /// Requested entity was not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Constraint violation (e.g., duplicate id).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backend does not implement this operation.
    #[error("{operation} is not supported by the {backend} store")]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },

    /// Database error from sqlx.
    #[cfg(feature = "postgres")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Reading or writing the memory store's data file failed.
    #[error("data file error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub(crate) fn malformed(entity: &'static str, reason: impl ToString) -> Self {
        Self::Malformed {
            entity,
            reason: reason.to_string(),
        }
    }

    /// Whether this is a missing-entity error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}
