//! Read-only catalog access for the storefront.
//!
//! Every method swallows backend failures: the error is logged and the caller
//! gets an empty list (or `None`). A shop page with no products is better than
//! a 500, and the next request simply tries again.

use std::fmt::Display;
use std::sync::Arc;

use tracing::{instrument, warn};

use gante_core::order::CatalogSnapshot;
use gante_core::{
    BoxOption, Category, CategoryFilter, Product, ProductId, ProductType, SizeOption, Topping,
};

use crate::client::StoreClient;

/// Degrading reader over a [`StoreClient`].
#[derive(Clone)]
pub struct CatalogReader {
    store: Arc<dyn StoreClient>,
}

fn or_empty<T>(result: Result<Vec<T>, impl Display>, what: &str) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!(error = %e, what, "Catalog read failed, returning empty list");
        Vec::new()
    })
}

impl CatalogReader {
    #[must_use]
    pub fn new(store: Arc<dyn StoreClient>) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn StoreClient> {
        &self.store
    }

    /// All products of one type.
    #[instrument(skip(self))]
    pub async fn list_products(&self, kind: ProductType) -> Vec<Product> {
        self.list_products_by_category(kind, &CategoryFilter::All)
            .await
    }

    /// Products of one type in one category (or all of them).
    #[instrument(skip(self))]
    pub async fn list_products_by_category(
        &self,
        kind: ProductType,
        category: &CategoryFilter,
    ) -> Vec<Product> {
        or_empty(self.store.list_products(kind, category).await, "products")
    }

    /// One product, or `None` if it is missing, of another type, or the
    /// backend failed.
    #[instrument(skip(self))]
    pub async fn get_product(&self, kind: ProductType, id: &ProductId) -> Option<Product> {
        match self.store.get_product(id).await {
            Ok(product) => product.filter(|p| p.kind == kind),
            Err(e) => {
                warn!(error = %e, product_id = %id, "Catalog read failed");
                None
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn list_categories(&self, kind: ProductType) -> Vec<Category> {
        or_empty(self.store.list_categories(kind).await, "categories")
    }

    #[instrument(skip(self))]
    pub async fn list_sizes(&self) -> Vec<SizeOption> {
        or_empty(self.store.list_sizes().await, "sizes")
    }

    #[instrument(skip(self))]
    pub async fn list_boxes(&self) -> Vec<BoxOption> {
        or_empty(self.store.list_boxes().await, "boxes")
    }

    #[instrument(skip(self))]
    pub async fn list_toppings(&self) -> Vec<Topping> {
        or_empty(self.store.list_toppings().await, "toppings")
    }

    #[instrument(skip(self))]
    pub async fn list_flavors_of_the_day(&self) -> Vec<Product> {
        or_empty(
            self.store.list_flavors_of_the_day().await,
            "flavors of the day",
        )
    }

    /// Products of one type plus every topping, for pricing a commit.
    #[instrument(skip(self))]
    pub async fn snapshot(&self, kind: ProductType) -> CatalogSnapshot {
        let (products, toppings) = tokio::join!(self.list_products(kind), async {
            if kind == ProductType::Frozen {
                self.list_toppings().await
            } else {
                Vec::new()
            }
        });
        CatalogSnapshot::new(products, toppings)
    }

    /// Whether the backend answers right now. Never cached.
    pub async fn is_available(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, backend = self.store.backend_name(), "Store ping failed");
                false
            }
        }
    }
}
