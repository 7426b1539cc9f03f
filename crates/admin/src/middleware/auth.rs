//! Staff identity extractor.
//!
//! Login happens upstream: an authenticating proxy sits in front of the admin
//! and forwards the staff member's identity in a header
//! (`ADMIN_AUTH_HEADER`). Handlers that change or read the catalog take
//! [`RequireAdminAuth`] and get 401 when the header is missing.

use std::fmt;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;

/// The staff member making the request, as reported by the proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity(String);

impl AdminIdentity {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AdminIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extractor that requires a proxy-supplied identity.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {admin}!")
/// }
/// ```
pub struct RequireAdminAuth(pub AdminIdentity);

impl FromRequestParts<AppState> for RequireAdminAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = &state.config().auth_header;
        let identity = parts
            .headers
            .get(header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Unauthorized(format!("missing {header} header")))?;

        set_sentry_user(identity);
        Ok(Self(AdminIdentity(identity.to_string())))
    }
}
