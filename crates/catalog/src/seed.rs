//! Initial catalog data and loading it into any backend.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use gante_core::{
    BoxOption, Category, CategoryFilter, CategoryId, Product, ProductId, ProductType, SizeOption,
    Topping,
};

use crate::client::{NewCategory, NewProduct, StoreClient};
use crate::error::StoreError;
use crate::memory::CatalogData;

const BUILTIN: &str = include_str!("../seed/catalog.yaml");

/// A catalog document as written in the seed YAML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedData {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub sizes: Vec<SizeOption>,
    #[serde(default)]
    pub boxes: Vec<BoxOption>,
    #[serde(default)]
    pub toppings: Vec<Topping>,
    #[serde(default)]
    pub flavors_of_the_day: Vec<ProductId>,
}

/// What [`apply`] wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub categories: usize,
    pub products: usize,
    pub sizes: usize,
    pub boxes: usize,
    pub toppings: usize,
    pub flavors_of_the_day: usize,
}

impl SeedData {
    /// The catalog shipped with the binary.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Malformed` if the embedded document does not parse.
    pub fn builtin() -> Result<Self, StoreError> {
        Self::from_yaml(BUILTIN)
    }

    /// Parse a seed document.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Malformed` if `yaml` is not a valid seed document.
    pub fn from_yaml(yaml: &str) -> Result<Self, StoreError> {
        serde_yaml::from_str(yaml).map_err(|e| StoreError::malformed("seed", e))
    }

    /// Read a seed document from disk.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file cannot be read, or
    /// `StoreError::Malformed` if it does not parse.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let yaml = tokio::fs::read_to_string(path).await?;
        Self::from_yaml(&yaml)
    }

    /// The memory backend's document for this seed, ids kept as written.
    #[must_use]
    pub fn into_catalog_data(self) -> CatalogData {
        CatalogData {
            categories: self.categories,
            products: self.products,
            sizes: self.sizes,
            boxes: self.boxes,
            toppings: self.toppings,
            flavors_of_the_day: self.flavors_of_the_day,
            next_id: 1,
        }
    }
}

/// Tolerate backends that cannot store extras.
fn skip_unsupported<T>(result: Result<T, StoreError>) -> Result<Option<T>, StoreError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e @ StoreError::Unsupported { .. }) => {
            warn!(error = %e, "Skipping seed entry");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Remove every product and category, plus extras where the backend allows.
async fn clear(store: &dyn StoreClient) -> Result<(), StoreError> {
    for kind in ProductType::ALL {
        for product in store.list_products(kind, &CategoryFilter::All).await? {
            store.delete_product(&product.id).await?;
        }
        for category in store.list_categories(kind).await? {
            store.delete_category(&category.id).await?;
        }
    }
    for size in store.list_sizes().await? {
        skip_unsupported(store.delete_size(&size.id).await)?;
    }
    for packaging in store.list_boxes().await? {
        skip_unsupported(store.delete_box(&packaging.id).await)?;
    }
    for topping in store.list_toppings().await? {
        skip_unsupported(store.delete_topping(&topping.id).await)?;
    }
    store.set_flavors_of_the_day(&[]).await?;
    Ok(())
}

/// Write `seed` into `store` through the [`StoreClient`] seam.
///
/// Backends assign their own product and category ids, so seed ids are
/// remapped when wiring up product categories and flavors of the day.
/// With `replace`, the existing catalog is cleared first.
///
/// # Errors
///
/// Returns the first store error, except `Unsupported` on sizes, boxes and
/// toppings, which is logged and skipped.
#[instrument(skip(store, seed), fields(backend = store.backend_name()))]
pub async fn apply(
    store: &dyn StoreClient,
    seed: SeedData,
    replace: bool,
) -> Result<SeedReport, StoreError> {
    if replace {
        clear(store).await?;
    }

    let mut report = SeedReport::default();

    let mut category_ids: HashMap<CategoryId, CategoryId> = HashMap::new();
    for category in seed.categories {
        let created = store
            .create_category(NewCategory {
                name: category.name,
                kind: category.kind,
            })
            .await?;
        category_ids.insert(category.id, created.id);
        report.categories += 1;
    }

    let mut product_ids: HashMap<ProductId, ProductId> = HashMap::new();
    for product in seed.products {
        let category = product
            .category
            .map(|id| category_ids.get(&id).cloned().unwrap_or(id));
        let created = store
            .create_product(NewProduct {
                name: product.name,
                description: product.description,
                price: product.price,
                category,
                kind: product.kind,
                image_url: product.image_url,
            })
            .await?;
        product_ids.insert(product.id, created.id);
        report.products += 1;
    }

    for size in seed.sizes {
        if skip_unsupported(store.save_size(size).await)?.is_some() {
            report.sizes += 1;
        }
    }
    for packaging in seed.boxes {
        if skip_unsupported(store.save_box(packaging).await)?.is_some() {
            report.boxes += 1;
        }
    }
    for topping in seed.toppings {
        if skip_unsupported(store.save_topping(topping).await)?.is_some() {
            report.toppings += 1;
        }
    }

    let flavors: Vec<ProductId> = seed
        .flavors_of_the_day
        .iter()
        .filter_map(|id| product_ids.get(id).cloned())
        .collect();
    report.flavors_of_the_day = store.set_flavors_of_the_day(&flavors).await?;

    info!(
        categories = report.categories,
        products = report.products,
        sizes = report.sizes,
        boxes = report.boxes,
        toppings = report.toppings,
        flavors_of_the_day = report.flavors_of_the_day,
        "Catalog seeded"
    );
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gante_core::Price;

    use super::*;
    use crate::memory::MemoryStore;

    #[test]
    fn test_builtin_seed_parses() {
        let seed = SeedData::builtin().unwrap();
        assert_eq!(seed.categories.len(), 7);
        assert_eq!(seed.sizes.len(), 7);
        assert_eq!(seed.boxes.len(), 3);
        assert_eq!(seed.toppings.len(), 6);

        let pistacchio = seed
            .products
            .iter()
            .find(|p| p.id.as_str() == "g2")
            .unwrap();
        assert_eq!(pistacchio.name, "Pistacchio");
        assert_eq!(pistacchio.price, Price::from_cents(1800));
        assert_eq!(pistacchio.kind, ProductType::Frozen);

        let medio = seed.sizes.iter().find(|s| s.id.as_str() == "medio").unwrap();
        assert_eq!(medio.unit_count, 2);
        assert!(seed
            .products
            .iter()
            .filter(|p| p.kind == ProductType::Misc)
            .all(|p| p.category.is_none()));
    }

    #[test]
    fn test_from_yaml_rejects_garbage() {
        let err = SeedData::from_yaml("products: [{name: 3}]").unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_apply_remaps_ids() {
        let seed = SeedData::from_yaml(
            r#"
categories:
  - {id: classicos, name: Classicos, type: frozen}
products:
  - {id: g1, name: Stracciatella, price: "16.00", category: classicos, type: frozen}
  - {id: g2, name: Pistacchio, price: "18.00", category: classicos, type: frozen}
sizes:
  - {id: medio, name: Medio, unitCount: 2, price: "16.00"}
flavorsOfTheDay: [g2, missing]
"#,
        )
        .unwrap();

        let store = MemoryStore::new(CatalogData::default());
        let report = apply(&store, seed, false).await.unwrap();
        assert_eq!(report.categories, 1);
        assert_eq!(report.products, 2);
        assert_eq!(report.sizes, 1);
        assert_eq!(report.flavors_of_the_day, 1);

        let category = &store.list_categories(ProductType::Frozen).await.unwrap()[0];
        let products = store
            .list_products(ProductType::Frozen, &CategoryFilter::Id(category.id.clone()))
            .await
            .unwrap();
        assert_eq!(products.len(), 2);

        let flavors = store.list_flavors_of_the_day().await.unwrap();
        assert_eq!(flavors.len(), 1);
        assert_eq!(flavors[0].name, "Pistacchio");
    }

    #[tokio::test]
    async fn test_apply_replace_clears_first() {
        let store = MemoryStore::new(SeedData::builtin().unwrap().into_catalog_data());
        let seed = SeedData::from_yaml(
            "products:\n  - {id: d1, name: Brownie, price: \"12.00\", type: misc}\n",
        )
        .unwrap();
        apply(&store, seed, true).await.unwrap();

        let data = store.export().await;
        assert_eq!(data.products.len(), 1);
        assert!(data.categories.is_empty());
        assert!(data.sizes.is_empty());
        assert!(data.flavors_of_the_day.is_empty());
    }
}
