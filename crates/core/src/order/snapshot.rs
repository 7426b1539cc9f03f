//! Read-only catalog view used to price a commit.

use std::collections::HashMap;

use crate::types::{Product, ProductId, Topping, ToppingId};

/// Products and toppings as they were when the customer hit "add".
///
/// Commits resolve names and prices here, never from the selection itself, so
/// a line item always reflects the catalog at commit time.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    products: HashMap<ProductId, Product>,
    toppings: HashMap<ToppingId, Topping>,
}

impl CatalogSnapshot {
    /// Build a snapshot from catalog listings.
    pub fn new(
        products: impl IntoIterator<Item = Product>,
        toppings: impl IntoIterator<Item = Topping>,
    ) -> Self {
        Self {
            products: products.into_iter().map(|p| (p.id.clone(), p)).collect(),
            toppings: toppings.into_iter().map(|t| (t.id.clone(), t)).collect(),
        }
    }

    #[must_use]
    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.products.get(id)
    }

    #[must_use]
    pub fn topping(&self, id: &ToppingId) -> Option<&Topping> {
        self.toppings.get(id)
    }
}
