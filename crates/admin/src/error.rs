//! Unified error handling for admin.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use gante_catalog::StoreError;

use crate::services::catalog::{CatalogError, ValidationError};

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// The request body broke a catalog rule.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The store refused or failed the operation.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// No identity header from the auth proxy.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(e) => Self::Validation(e),
            CatalogError::Store(e) => Self::Store(e),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Store(StoreError::Unsupported { .. }) => StatusCode::NOT_IMPLEMENTED,
            Self::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Whether the details should stay out of the response.
    const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Store(StoreError::Unavailable(_) | StoreError::Malformed { .. } | StoreError::Io(_))
        ) || self.is_database()
    }

    #[cfg(feature = "postgres")]
    const fn is_database(&self) -> bool {
        matches!(self, Self::Store(StoreError::Database(_)))
    }

    #[cfg(not(feature = "postgres"))]
    const fn is_database(&self) -> bool {
        false
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        // Don't expose internal error details to clients
        let error = if self.is_internal() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorBody { error })).into_response()
    }
}

/// Set the Sentry user context from the proxy identity.
pub fn set_sentry_user(identity: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(identity.to_string()),
            email: identity.contains('@').then(|| identity.to_string()),
            ..Default::default()
        }));
    });
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
