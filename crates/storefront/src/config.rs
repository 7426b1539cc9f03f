//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `WHATSAPP_NUMBER` - Shop number orders are sent to, with country code
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `SHOP_NAME` - Heading of the order message (default: Gante Gelato & Chocolates)
//! - `DELIVERY_FEE` - Flat delivery surcharge in reais (default: 0)
//! - `ORDER_FLAVOR_POLICY` - `exact` or `up-to-cap` (default: exact)
//! - `ORDER_CONFECTION_POLICY` - `per-item` or `boxed` (default: per-item)
//! - `SESSION_MAX_ENTRIES` - Open visitor sessions kept in memory (default: 10000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//!
//! Store selection (`STORE_BACKEND` and friends) is documented in
//! [`gante_catalog::config`].

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;
use url::Url;

use gante_catalog::{StoreConfig, StoreConfigError};
use gante_core::message::{MessageSettings, normalize_phone};
use gante_core::order::{ConfectionPolicy, FlavorPolicy, OrderPolicy};
use gante_core::{CurrencyCode, Price};

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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: Url,
    /// Shop WhatsApp number, digits only
    pub whatsapp_number: String,
    /// Order message settings
    pub message: MessageSettings,
    /// Order builder rules
    pub policy: OrderPolicy,
    /// Catalog backend
    pub store: StoreConfig,
    /// Cap on open visitor sessions
    pub session_max_entries: usize,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the environment.
    ///
    /// # Errors
    ///
    /// See [`StorefrontConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let host = env.parsed::<IpAddr>("STOREFRONT_HOST", "127.0.0.1")?;
        let port = env.parsed::<u16>("STOREFRONT_PORT", "3000")?;
        let base_url = Url::parse(&env.required("STOREFRONT_BASE_URL")?)
            .map_err(|e| invalid("STOREFRONT_BASE_URL", e))?;
        let whatsapp_number = normalize_phone(&env.required("WHATSAPP_NUMBER")?)
            .map_err(|e| invalid("WHATSAPP_NUMBER", e))?;

        let message = MessageSettings {
            shop_name: env.or_default("SHOP_NAME", "Gante Gelato & Chocolates"),
            currency: CurrencyCode::default(),
            delivery_fee: parse_fee(&env.or_default("DELIVERY_FEE", "0"))
                .map_err(|e| invalid("DELIVERY_FEE", e))?,
        };
        let policy = OrderPolicy {
            flavors: env.parsed::<FlavorPolicy>("ORDER_FLAVOR_POLICY", "exact")?,
            confections: env.parsed::<ConfectionPolicy>("ORDER_CONFECTION_POLICY", "per-item")?,
        };

        Ok(Self {
            host,
            port,
            base_url,
            whatsapp_number,
            message,
            policy,
            store: StoreConfig::from_lookup(&lookup)?,
            session_max_entries: env.parsed::<usize>("SESSION_MAX_ENTRIES", "10000")?,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    /// Get an optional variable. Blank counts as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| invalid(key, e))
    }
}

fn invalid(key: &str, err: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidEnvVar(key.to_string(), err.to_string())
}

/// Parse a fee in reais. Accepts `5`, `5.50` or `5,50`.
fn parse_fee(raw: &str) -> Result<Price, String> {
    let amount = Decimal::from_str(&raw.trim().replace(',', ".")).map_err(|e| e.to_string())?;
    if amount.is_sign_negative() {
        return Err("must not be negative".to_string());
    }
    Ok(Price::new(amount))
}
