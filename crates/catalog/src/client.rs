//! The storage seam: one trait, several backends.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use gante_core::{
    BoxId, BoxOption, Category, CategoryFilter, CategoryId, Price, Product, ProductId,
    ProductType, SizeId, SizeOption, Topping, ToppingId,
};

use crate::error::StoreError;

/// Fields for a new product. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: Price,
    #[serde(default)]
    pub category: Option<CategoryId>,
    #[serde(rename = "type")]
    pub kind: ProductType,
    #[serde(default)]
    pub image_url: String,
}

/// Partial product update. Absent fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<Price>,
    /// `Some(None)` clears the category; `None` leaves it.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<Option<CategoryId>>,
    #[serde(default, rename = "type")]
    pub kind: Option<ProductType>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ProductPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.category.is_none()
            && self.kind.is_none()
            && self.image_url.is_none()
    }

    /// Apply to an in-memory product.
    pub fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(kind) = self.kind {
            product.kind = kind;
        }
        if let Some(image_url) = self.image_url {
            product.image_url = image_url;
        }
    }
}

/// Distinguish an explicit `null` from a missing field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Fields for a new category. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ProductType,
}

/// Category rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPatch {
    pub name: String,
}

/// Catalog storage.
///
/// Every backend (in-memory, the PHP REST API, `PostgreSQL`) implements this
/// trait and services hold it as `Arc<dyn StoreClient>`. Reads return the
/// backend's error; degrading to empty data is the
/// [`CatalogReader`](crate::CatalogReader)'s job.
///
/// Listing order: products in creation order, sizes by price, boxes by unit
/// count, toppings and flavors of the day by name.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Short backend name for logs and health output.
    fn backend_name(&self) -> &'static str;

    /// Cheap round trip proving the backend answers.
    async fn ping(&self) -> Result<(), StoreError>;

    // Products

    async fn list_products(
        &self,
        kind: ProductType,
        category: &CategoryFilter,
    ) -> Result<Vec<Product>, StoreError>;

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError>;

    async fn create_product(&self, product: NewProduct) -> Result<Product, StoreError>;

    /// Returns `StoreError::NotFound` for an unknown id.
    async fn update_product(
        &self,
        id: &ProductId,
        patch: ProductPatch,
    ) -> Result<Product, StoreError>;

    /// Returns `StoreError::NotFound` for an unknown id.
    async fn delete_product(&self, id: &ProductId) -> Result<(), StoreError>;

    // Categories

    async fn list_categories(&self, kind: ProductType) -> Result<Vec<Category>, StoreError>;

    async fn create_category(&self, category: NewCategory) -> Result<Category, StoreError>;

    async fn update_category(
        &self,
        id: &CategoryId,
        patch: CategoryPatch,
    ) -> Result<Category, StoreError>;

    /// Products in the category keep their (now dangling) reference.
    async fn delete_category(&self, id: &CategoryId) -> Result<(), StoreError>;

    // Extras

    async fn list_sizes(&self) -> Result<Vec<SizeOption>, StoreError>;

    /// Insert, or replace the size with the same id.
    async fn save_size(&self, size: SizeOption) -> Result<SizeOption, StoreError>;

    async fn delete_size(&self, id: &SizeId) -> Result<(), StoreError>;

    async fn list_boxes(&self) -> Result<Vec<BoxOption>, StoreError>;

    async fn save_box(&self, packaging: BoxOption) -> Result<BoxOption, StoreError>;

    async fn delete_box(&self, id: &BoxId) -> Result<(), StoreError>;

    async fn list_toppings(&self) -> Result<Vec<Topping>, StoreError>;

    async fn save_topping(&self, topping: Topping) -> Result<Topping, StoreError>;

    async fn delete_topping(&self, id: &ToppingId) -> Result<(), StoreError>;

    // Flavors of the day

    /// Frozen products flagged for today, by name.
    async fn list_flavors_of_the_day(&self) -> Result<Vec<Product>, StoreError>;

    /// Replace the whole set. Returns how many ids were stored.
    async fn set_flavors_of_the_day(&self, ids: &[ProductId]) -> Result<usize, StoreError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_distinguishes_null_from_missing() {
        let patch: ProductPatch = serde_json::from_str(r#"{"name":"Nocciola"}"#).unwrap();
        assert_eq!(patch.category, None);

        let patch: ProductPatch = serde_json::from_str(r#"{"category":null}"#).unwrap();
        assert_eq!(patch.category, Some(None));

        let patch: ProductPatch = serde_json::from_str(r#"{"category":"classicos"}"#).unwrap();
        assert_eq!(patch.category, Some(Some(CategoryId::new("classicos"))));
    }

    #[test]
    fn test_patch_apply_touches_only_present_fields() {
        let mut product = Product {
            id: ProductId::new("g5"),
            name: "Nocciola".to_string(),
            description: "Avela".to_string(),
            price: Price::from_cents(1800),
            category: Some(CategoryId::new("classicos")),
            kind: ProductType::Frozen,
            image_url: String::new(),
        };
        let patch = ProductPatch {
            price: Some(Price::from_cents(1900)),
            category: Some(None),
            ..ProductPatch::default()
        };
        assert!(!patch.is_empty());
        patch.apply(&mut product);

        assert_eq!(product.price, Price::from_cents(1900));
        assert_eq!(product.category, None);
        assert_eq!(product.name, "Nocciola");
        assert_eq!(product.description, "Avela");
    }

    #[test]
    fn test_new_product_defaults() {
        let product: NewProduct =
            serde_json::from_str(r#"{"name":"Agua com Gas","type":"diversos"}"#).unwrap();
        assert_eq!(product.kind, ProductType::Misc);
        assert_eq!(product.price, Price::ZERO);
        assert!(product.category.is_none());
    }
}
