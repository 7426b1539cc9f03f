//! Application state shared across handlers.

use std::sync::Arc;

use gante_catalog::{CatalogReader, StoreClient};

use crate::config::AdminConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    catalog: CatalogReader,
}

impl AppState {
    /// Create a new application state over an already connected store.
    #[must_use]
    pub fn new(config: AdminConfig, store: Arc<dyn StoreClient>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog: CatalogReader::new(store),
            }),
        }
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Degrading reader for list endpoints.
    #[must_use]
    pub fn catalog(&self) -> &CatalogReader {
        &self.inner.catalog
    }

    /// The store itself, for writes.
    #[must_use]
    pub fn store(&self) -> &dyn StoreClient {
        self.inner.catalog.store().as_ref()
    }
}
