//! Store selection, shared by every binary.
//!
//! # Environment Variables
//!
//! - `STORE_BACKEND` - `memory`, `http` or `postgres` (default: memory)
//! - `STORE_DATA_FILE` - JSON file the memory store persists to
//! - `STORE_SEED_FILE` - YAML seed for a memory store with no data file yet
//! - `STORE_API_URL` - PHP API base URL (required for `http`)
//! - `STORE_API_TIMEOUT_SECS` - Request timeout for `http` (default: 10)
//! - `DATABASE_URL` - `PostgreSQL` connection string (required for `postgres`)
//! - `SITE_BASE_URL` - Base for relative product image paths

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::client::StoreClient;
use crate::error::StoreError;
use crate::memory::MemoryStore;
use crate::seed::SeedData;

/// Errors loading the store configuration.
#[derive(Debug, Error)]
pub enum StoreConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which [`StoreClient`] implementation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Memory,
    Http,
    Postgres,
}

impl StoreBackend {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Http => "http",
            Self::Postgres => "postgres",
        }
    }

    /// Whether this binary was built with the backend's cargo feature.
    #[must_use]
    pub const fn is_compiled(&self) -> bool {
        match self {
            Self::Memory => true,
            Self::Http => cfg!(feature = "http"),
            Self::Postgres => cfg!(feature = "postgres"),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "http" => Ok(Self::Http),
            "postgres" => Ok(Self::Postgres),
            other => Err(format!("unknown backend: {other}")),
        }
    }
}

/// Store configuration.
///
/// Implements `Debug` manually to redact the database URL.
#[derive(Clone, Default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub data_file: Option<PathBuf>,
    pub seed_file: Option<PathBuf>,
    pub api_url: Option<Url>,
    pub api_timeout: Duration,
    pub database_url: Option<SecretString>,
    pub site_base_url: Option<Url>,
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("backend", &self.backend)
            .field("data_file", &self.data_file)
            .field("seed_file", &self.seed_file)
            .field("api_url", &self.api_url)
            .field("api_timeout", &self.api_timeout)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("site_base_url", &self.site_base_url)
            .finish()
    }
}

impl StoreConfig {
    /// An unpersisted memory store seeded with the built-in catalog.
    #[must_use]
    pub fn memory() -> Self {
        Self {
            api_timeout: Duration::from_secs(10),
            ..Self::default()
        }
    }

    /// Load from the process environment. The caller loads `.env`.
    ///
    /// # Errors
    ///
    /// Returns `StoreConfigError` if a variable is malformed, the selected
    /// backend's required variables are missing, or the backend was not
    /// compiled in.
    pub fn from_env() -> Result<Self, StoreConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the environment.
    ///
    /// # Errors
    ///
    /// See [`StoreConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StoreConfigError> {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let invalid = |key: &str, e: &dyn fmt::Display| {
            StoreConfigError::InvalidEnvVar(key.to_string(), e.to_string())
        };
        let parse_url = |key: &str| -> Result<Option<Url>, StoreConfigError> {
            optional(key)
                .map(|v| Url::parse(&v).map_err(|e| invalid(key, &e)))
                .transpose()
        };

        let backend = optional("STORE_BACKEND")
            .map(|v| v.parse::<StoreBackend>().map_err(|e| invalid("STORE_BACKEND", &e)))
            .transpose()?
            .unwrap_or_default();
        if !backend.is_compiled() {
            return Err(invalid(
                "STORE_BACKEND",
                &format!("the {backend} backend is not compiled into this binary"),
            ));
        }

        let timeout_secs = optional("STORE_API_TIMEOUT_SECS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u64>()
            .map_err(|e| invalid("STORE_API_TIMEOUT_SECS", &e))?;

        let config = Self {
            backend,
            data_file: optional("STORE_DATA_FILE").map(PathBuf::from),
            seed_file: optional("STORE_SEED_FILE").map(PathBuf::from),
            api_url: parse_url("STORE_API_URL")?,
            api_timeout: Duration::from_secs(timeout_secs),
            database_url: optional("DATABASE_URL").map(SecretString::from),
            site_base_url: parse_url("SITE_BASE_URL")?,
        };

        match backend {
            StoreBackend::Http if config.api_url.is_none() => {
                Err(StoreConfigError::MissingEnvVar("STORE_API_URL".to_string()))
            }
            StoreBackend::Postgres if config.database_url.is_none() => {
                Err(StoreConfigError::MissingEnvVar("DATABASE_URL".to_string()))
            }
            _ => Ok(config),
        }
    }
}

async fn initial_memory_data(config: &StoreConfig) -> Result<SeedData, StoreError> {
    match &config.seed_file {
        Some(path) => SeedData::from_file(path).await,
        None => SeedData::builtin(),
    }
}

/// Build the configured store.
///
/// # Errors
///
/// Returns `StoreError` if the backend cannot be initialized (unreadable data
/// file, database unreachable, bad HTTP client configuration).
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn StoreClient>, StoreError> {
    let store: Arc<dyn StoreClient> = match config.backend {
        StoreBackend::Memory => {
            let initial = initial_memory_data(config).await?.into_catalog_data();
            match &config.data_file {
                Some(path) => Arc::new(MemoryStore::open(path, initial).await?),
                None => Arc::new(MemoryStore::new(initial)),
            }
        }
        #[cfg(feature = "http")]
        StoreBackend::Http => {
            let api_url = config.api_url.as_ref().ok_or_else(|| {
                StoreError::Unavailable("STORE_API_URL is not set".to_string())
            })?;
            Arc::new(crate::http::HttpStore::new(
                api_url,
                config.site_base_url.clone(),
                config.api_timeout,
            )?)
        }
        #[cfg(feature = "postgres")]
        StoreBackend::Postgres => {
            let database_url = config.database_url.as_ref().ok_or_else(|| {
                StoreError::Unavailable("DATABASE_URL is not set".to_string())
            })?;
            let pool = crate::postgres::create_pool(database_url).await?;
            Arc::new(crate::postgres::PostgresStore::new(pool))
        }
        #[allow(unreachable_patterns)]
        other => {
            return Err(StoreError::Unsupported {
                backend: other.as_str(),
                operation: "connect",
            });
        }
    };
    info!(backend = store.backend_name(), "Store connected");
    Ok(store)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use gante_core::ProductType;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StoreConfig, StoreConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StoreConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_to_memory() {
        let config = load(&[]).unwrap();
        assert_eq!(config.backend, StoreBackend::Memory);
        assert_eq!(config.api_timeout, Duration::from_secs(10));
        assert!(config.data_file.is_none());
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("HTTP".parse::<StoreBackend>().unwrap(), StoreBackend::Http);
        assert!("mysql".parse::<StoreBackend>().is_err());
        assert!(matches!(
            load(&[("STORE_BACKEND", "mysql")]),
            Err(StoreConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_requires_api_url() {
        let err = load(&[("STORE_BACKEND", "http")]).unwrap_err();
        assert!(matches!(err, StoreConfigError::MissingEnvVar(ref k) if k == "STORE_API_URL"));

        let config = load(&[
            ("STORE_BACKEND", "http"),
            ("STORE_API_URL", "https://ganteartesanal.com.br/api/"),
            ("STORE_API_TIMEOUT_SECS", "3"),
        ])
        .unwrap();
        assert_eq!(config.api_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = load(&[("SITE_BASE_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, StoreConfigError::InvalidEnvVar(ref k, _) if k == "SITE_BASE_URL"));
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config = StoreConfig {
            database_url: Some(SecretString::from("postgres://gante:hunter2@db/gante")),
            ..StoreConfig::memory()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_connect_memory_with_data_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            data_file: Some(dir.path().join("catalog.json")),
            ..StoreConfig::memory()
        };
        let store = connect(&config).await.unwrap();
        assert_eq!(store.backend_name(), "memory");
        assert!(!store.list_sizes().await.unwrap().is_empty());
        assert!(dir.path().join("catalog.json").exists());

        let categories = store.list_categories(ProductType::Confection).await.unwrap();
        assert_eq!(categories.len(), 4);
    }
}
