//! Application state shared across handlers.

use std::sync::Arc;

use gante_catalog::{CatalogReader, StoreClient};

use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the configuration and the catalog.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: CatalogReader,
}

impl AppState {
    /// Create a new application state over an already connected store.
    #[must_use]
    pub fn new(config: StorefrontConfig, store: Arc<dyn StoreClient>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog: CatalogReader::new(store),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the degrading catalog reader.
    #[must_use]
    pub fn catalog(&self) -> &CatalogReader {
        &self.inner.catalog
    }
}
