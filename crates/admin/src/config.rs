//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ADMIN_AUTH_HEADER` - Identity header set by the auth proxy
//!   (default: x-auth-request-email)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//!
//! The admin has no login of its own. It must only be reachable through a
//! proxy that authenticates staff and sets the identity header.
//!
//! Store selection (`STORE_BACKEND` and friends) is documented in
//! [`gante_catalog::config`].

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use axum::http::HeaderName;
use thiserror::Error;

use gante_catalog::{StoreConfig, StoreConfigError};

/// Header used when `ADMIN_AUTH_HEADER` is unset.
pub const DEFAULT_AUTH_HEADER: &str = "x-auth-request-email";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error(transparent)]
    Store(#[from] StoreConfigError),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Header carrying the authenticated staff identity
    pub auth_header: HeaderName,
    /// Catalog backend
    pub store: StoreConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the environment.
    ///
    /// # Errors
    ///
    /// See [`AdminConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = parse_or(&lookup, "ADMIN_HOST", "127.0.0.1")?;
        let port = parse_or(&lookup, "ADMIN_PORT", "3001")?;
        let auth_header = HeaderName::from_str(
            &get_env_or_default(&lookup, "ADMIN_AUTH_HEADER", DEFAULT_AUTH_HEADER)
                .to_ascii_lowercase(),
        )
        .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_AUTH_HEADER".to_string(), e.to_string()))?;

        Ok(Self {
            host,
            port,
            auth_header,
            store: StoreConfig::from_lookup(&lookup)?,
            sentry_dsn: get_optional_env(&lookup, "SENTRY_DSN"),
            sentry_environment: get_optional_env(&lookup, "SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable. Blank counts as unset.
fn get_optional_env(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> String {
    get_optional_env(lookup, key).unwrap_or_else(|| default.to_string())
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(lookup, key, default)
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use gante_catalog::StoreBackend;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<AdminConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AdminConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3001");
        assert_eq!(config.auth_header.as_str(), DEFAULT_AUTH_HEADER);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_custom_auth_header_is_lowercased() {
        let config = load(&[("ADMIN_AUTH_HEADER", "X-Forwarded-User")]).unwrap();
        assert_eq!(config.auth_header.as_str(), "x-forwarded-user");
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            load(&[("ADMIN_AUTH_HEADER", "not a header")]),
            Err(ConfigError::InvalidEnvVar(ref k, _)) if k == "ADMIN_AUTH_HEADER"
        ));
        assert!(matches!(
            load(&[("ADMIN_PORT", "99999")]),
            Err(ConfigError::InvalidEnvVar(ref k, _)) if k == "ADMIN_PORT"
        ));
        assert!(matches!(
            load(&[("STORE_BACKEND", "http")]),
            Err(ConfigError::Store(_))
        ));
    }
}
