//! In-memory store with optional JSON file persistence.
//!
//! The default backend for development and tests. When opened with a data
//! file, the whole catalog is written back after every mutation so a restart
//! picks up where it left off.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use gante_core::{
    BoxId, BoxOption, Category, CategoryFilter, CategoryId, Product, ProductId, ProductType,
    SizeId, SizeOption, Topping, ToppingId,
};

use crate::client::{CategoryPatch, NewCategory, NewProduct, ProductPatch, StoreClient};
use crate::error::StoreError;

/// Everything the memory store holds. Also the on-disk document format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogData {
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
    /// Next candidate for a generated product or category id.
    #[serde(default = "first_id")]
    pub next_id: u64,
}

const fn first_id() -> u64 {
    1
}

impl CatalogData {
    /// Hand out the next numeric id not already taken by `taken`.
    fn allocate_id(&mut self, taken: impl Fn(&str) -> bool) -> String {
        loop {
            let candidate = self.next_id.max(1).to_string();
            self.next_id = self.next_id.max(1) + 1;
            if !taken(&candidate) {
                return candidate;
            }
        }
    }
}

/// `RwLock`-guarded catalog, optionally mirrored to a JSON file.
pub struct MemoryStore {
    data: RwLock<CatalogData>,
    path: Option<PathBuf>,
}

impl MemoryStore {
    /// A store holding `data`, never written to disk.
    #[must_use]
    pub fn new(data: CatalogData) -> Self {
        Self {
            data: RwLock::new(data),
            path: None,
        }
    }

    /// Open a store backed by `path`.
    ///
    /// Loads the file when it exists; otherwise starts from `initial` and
    /// writes it out immediately.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file cannot be read or written, or
    /// `StoreError::Malformed` if it is not a valid catalog document.
    pub async fn open(path: impl AsRef<Path>, initial: CatalogData) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let data = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::malformed("catalog file", e))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Data file missing, starting from seed");
                write_file(&path, &initial).await?;
                initial
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            data: RwLock::new(data),
            path: Some(path),
        })
    }

    /// A copy of the current contents.
    pub async fn export(&self) -> CatalogData {
        self.data.read().await.clone()
    }

    async fn persist(&self, data: &CatalogData) -> Result<(), StoreError> {
        match &self.path {
            Some(path) => write_file(path, data).await,
            None => Ok(()),
        }
    }

    /// Run a mutation on a copy under the write lock, persist the copy, then
    /// swap it in. A failed mutation or write leaves the store unchanged.
    async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut CatalogData) -> Result<T, StoreError> + Send,
    ) -> Result<T, StoreError> {
        let mut data = self.data.write().await;
        let mut next = data.clone();
        let result = f(&mut next)?;
        self.persist(&next).await?;
        *data = next;
        Ok(result)
    }
}

async fn write_file(path: &Path, data: &CatalogData) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(data).map_err(|e| StoreError::malformed("catalog file", e))?;
    // Write then rename so a crash never leaves a half-written file.
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

fn sorted_by_name<T: Clone>(items: &[T], name: impl Fn(&T) -> &str) -> Vec<T> {
    let mut items = items.to_vec();
    items.sort_by(|a, b| name(a).to_lowercase().cmp(&name(b).to_lowercase()));
    items
}

/// Insert `item`, or replace the entry with the same key.
fn upsert<T: Clone, K: PartialEq>(items: &mut Vec<T>, item: T, key: impl Fn(&T) -> &K) -> T {
    if let Some(existing) = items.iter_mut().find(|i| key(i) == key(&item)) {
        *existing = item.clone();
    } else {
        items.push(item.clone());
    }
    item
}

/// Remove the entry with `id`, or fail with `NotFound`.
fn remove<T, K: PartialEq + std::fmt::Display>(
    items: &mut Vec<T>,
    id: &K,
    entity: &str,
    key: impl Fn(&T) -> &K,
) -> Result<(), StoreError> {
    let before = items.len();
    items.retain(|i| key(i) != id);
    if items.len() == before {
        return Err(StoreError::NotFound(format!("{entity} {id}")));
    }
    Ok(())
}

#[async_trait]
impl StoreClient for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_products(
        &self,
        kind: ProductType,
        category: &CategoryFilter,
    ) -> Result<Vec<Product>, StoreError> {
        let data = self.data.read().await;
        Ok(data
            .products
            .iter()
            .filter(|p| p.kind == kind && category.matches(p))
            .cloned()
            .collect())
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let data = self.data.read().await;
        Ok(data.products.iter().find(|p| &p.id == id).cloned())
    }

    #[instrument(skip(self, product), fields(name = %product.name))]
    async fn create_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        self.mutate(|data| {
            let taken: Vec<String> = data.products.iter().map(|p| p.id.to_string()).collect();
            let id = data.allocate_id(|candidate| taken.iter().any(|t| t == candidate));
            let product = Product {
                id: ProductId::new(id),
                name: product.name,
                description: product.description,
                price: product.price,
                category: product.category,
                kind: product.kind,
                image_url: product.image_url,
            };
            data.products.push(product.clone());
            Ok(product)
        })
        .await
    }

    #[instrument(skip(self, patch))]
    async fn update_product(
        &self,
        id: &ProductId,
        patch: ProductPatch,
    ) -> Result<Product, StoreError> {
        self.mutate(|data| {
            let product = data
                .products
                .iter_mut()
                .find(|p| &p.id == id)
                .ok_or_else(|| StoreError::NotFound(format!("product {id}")))?;
            patch.apply(product);
            Ok(product.clone())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn delete_product(&self, id: &ProductId) -> Result<(), StoreError> {
        self.mutate(|data| {
            remove(&mut data.products, id, "product", |p| &p.id)?;
            data.flavors_of_the_day.retain(|f| f != id);
            Ok(())
        })
        .await
    }

    async fn list_categories(&self, kind: ProductType) -> Result<Vec<Category>, StoreError> {
        let data = self.data.read().await;
        Ok(data
            .categories
            .iter()
            .filter(|c| c.kind == kind)
            .cloned()
            .collect())
    }

    #[instrument(skip(self, category), fields(name = %category.name))]
    async fn create_category(&self, category: NewCategory) -> Result<Category, StoreError> {
        self.mutate(|data| {
            let taken: Vec<String> = data.categories.iter().map(|c| c.id.to_string()).collect();
            let id = data.allocate_id(|candidate| taken.iter().any(|t| t == candidate));
            let category = Category {
                id: CategoryId::new(id),
                name: category.name,
                kind: category.kind,
            };
            data.categories.push(category.clone());
            Ok(category)
        })
        .await
    }

    #[instrument(skip(self, patch))]
    async fn update_category(
        &self,
        id: &CategoryId,
        patch: CategoryPatch,
    ) -> Result<Category, StoreError> {
        self.mutate(|data| {
            let category = data
                .categories
                .iter_mut()
                .find(|c| &c.id == id)
                .ok_or_else(|| StoreError::NotFound(format!("category {id}")))?;
            category.name = patch.name;
            Ok(category.clone())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn delete_category(&self, id: &CategoryId) -> Result<(), StoreError> {
        self.mutate(|data| remove(&mut data.categories, id, "category", |c| &c.id))
            .await
    }

    async fn list_sizes(&self) -> Result<Vec<SizeOption>, StoreError> {
        let mut sizes = self.data.read().await.sizes.clone();
        sizes.sort_by_key(|s| s.price);
        Ok(sizes)
    }

    #[instrument(skip(self, size), fields(id = %size.id))]
    async fn save_size(&self, size: SizeOption) -> Result<SizeOption, StoreError> {
        self.mutate(|data| Ok(upsert(&mut data.sizes, size, |s| &s.id)))
            .await
    }

    #[instrument(skip(self))]
    async fn delete_size(&self, id: &SizeId) -> Result<(), StoreError> {
        self.mutate(|data| remove(&mut data.sizes, id, "size", |s| &s.id))
            .await
    }

    async fn list_boxes(&self) -> Result<Vec<BoxOption>, StoreError> {
        let mut boxes = self.data.read().await.boxes.clone();
        boxes.sort_by_key(|b| b.unit_count);
        Ok(boxes)
    }

    #[instrument(skip(self, packaging), fields(id = %packaging.id))]
    async fn save_box(&self, packaging: BoxOption) -> Result<BoxOption, StoreError> {
        self.mutate(|data| Ok(upsert(&mut data.boxes, packaging, |b| &b.id)))
            .await
    }

    #[instrument(skip(self))]
    async fn delete_box(&self, id: &BoxId) -> Result<(), StoreError> {
        self.mutate(|data| remove(&mut data.boxes, id, "box", |b| &b.id))
            .await
    }

    async fn list_toppings(&self) -> Result<Vec<Topping>, StoreError> {
        let data = self.data.read().await;
        Ok(sorted_by_name(&data.toppings, |t| t.name.as_str()))
    }

    #[instrument(skip(self, topping), fields(id = %topping.id))]
    async fn save_topping(&self, topping: Topping) -> Result<Topping, StoreError> {
        self.mutate(|data| Ok(upsert(&mut data.toppings, topping, |t| &t.id)))
            .await
    }

    #[instrument(skip(self))]
    async fn delete_topping(&self, id: &ToppingId) -> Result<(), StoreError> {
        self.mutate(|data| remove(&mut data.toppings, id, "topping", |t| &t.id))
            .await
    }

    async fn list_flavors_of_the_day(&self) -> Result<Vec<Product>, StoreError> {
        let data = self.data.read().await;
        let flagged: Vec<Product> = data
            .products
            .iter()
            .filter(|p| p.kind == ProductType::Frozen && data.flavors_of_the_day.contains(&p.id))
            .cloned()
            .collect();
        Ok(sorted_by_name(&flagged, |p| p.name.as_str()))
    }

    #[instrument(skip(self))]
    async fn set_flavors_of_the_day(&self, ids: &[ProductId]) -> Result<usize, StoreError> {
        let ids = ids.to_vec();
        self.mutate(move |data| {
            let mut unique: Vec<ProductId> = Vec::with_capacity(ids.len());
            for id in ids {
                if !unique.contains(&id) {
                    unique.push(id);
                }
            }
            let count = unique.len();
            data.flavors_of_the_day = unique;
            Ok(count)
        })
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gante_core::Price;

    use super::*;

    fn new_product(name: &str, kind: ProductType, category: Option<&str>) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: String::new(),
            price: Price::from_cents(1600),
            category: category.map(CategoryId::new),
            kind,
            image_url: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = MemoryStore::new(CatalogData::default());
        let a = store
            .create_product(new_product("Stracciatella", ProductType::Frozen, None))
            .await
            .unwrap();
        let b = store
            .create_product(new_product("Pistacchio", ProductType::Frozen, None))
            .await
            .unwrap();
        assert_eq!(a.id.as_str(), "1");
        assert_eq!(b.id.as_str(), "2");
    }

    #[tokio::test]
    async fn test_generated_ids_skip_taken_ones() {
        let mut data = CatalogData::default();
        data.products.push(Product {
            id: ProductId::new("1"),
            name: "Seeded".to_string(),
            description: String::new(),
            price: Price::ZERO,
            category: None,
            kind: ProductType::Misc,
            image_url: String::new(),
        });
        let store = MemoryStore::new(data);
        let created = store
            .create_product(new_product("Agua", ProductType::Misc, None))
            .await
            .unwrap();
        assert_eq!(created.id.as_str(), "2");
    }

    #[tokio::test]
    async fn test_list_filters_by_type_and_category() {
        let store = MemoryStore::new(CatalogData::default());
        store
            .create_product(new_product("Stracciatella", ProductType::Frozen, Some("classicos")))
            .await
            .unwrap();
        store
            .create_product(new_product("Acai", ProductType::Frozen, Some("especiais")))
            .await
            .unwrap();
        store
            .create_product(new_product("Trufa", ProductType::Confection, Some("trufas")))
            .await
            .unwrap();

        let frozen = store
            .list_products(ProductType::Frozen, &CategoryFilter::All)
            .await
            .unwrap();
        assert_eq!(frozen.len(), 2);

        let classicos = store
            .list_products(
                ProductType::Frozen,
                &CategoryFilter::Id(CategoryId::new("classicos")),
            )
            .await
            .unwrap();
        assert_eq!(classicos.len(), 1);
        assert_eq!(classicos[0].name, "Stracciatella");
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_product() {
        let store = MemoryStore::new(CatalogData::default());
        let err = store
            .update_product(&ProductId::new("404"), ProductPatch::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(
            store
                .delete_product(&ProductId::new("404"))
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn test_delete_category_leaves_products_dangling() {
        let store = MemoryStore::new(CatalogData::default());
        let category = store
            .create_category(NewCategory {
                name: "Classicos".to_string(),
                kind: ProductType::Frozen,
            })
            .await
            .unwrap();
        let product = store
            .create_product(new_product(
                "Stracciatella",
                ProductType::Frozen,
                Some(category.id.as_str()),
            ))
            .await
            .unwrap();

        store.delete_category(&category.id).await.unwrap();
        let product = store.get_product(&product.id).await.unwrap().unwrap();
        assert_eq!(product.category, Some(category.id));
    }

    #[tokio::test]
    async fn test_save_size_upserts_and_lists_by_price() {
        let store = MemoryStore::new(CatalogData::default());
        let grande = SizeOption {
            id: SizeId::new("grande"),
            name: "Grande".to_string(),
            unit_count: 3,
            price: Price::from_cents(2200),
        };
        let pequeno = SizeOption {
            id: SizeId::new("pequeno"),
            name: "Pequeno".to_string(),
            unit_count: 1,
            price: Price::from_cents(1000),
        };
        store.save_size(grande.clone()).await.unwrap();
        store.save_size(pequeno).await.unwrap();
        store
            .save_size(SizeOption {
                name: "Grandao".to_string(),
                ..grande
            })
            .await
            .unwrap();

        let sizes = store.list_sizes().await.unwrap();
        let names: Vec<_> = sizes.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Pequeno", "Grandao"]);
    }

    #[tokio::test]
    async fn test_flavors_of_the_day_only_frozen_and_by_name() {
        let store = MemoryStore::new(CatalogData::default());
        let nocciola = store
            .create_product(new_product("Nocciola", ProductType::Frozen, None))
            .await
            .unwrap();
        let amarena = store
            .create_product(new_product("Amarena", ProductType::Frozen, None))
            .await
            .unwrap();
        let trufa = store
            .create_product(new_product("Trufa", ProductType::Confection, None))
            .await
            .unwrap();

        let count = store
            .set_flavors_of_the_day(&[
                nocciola.id.clone(),
                amarena.id.clone(),
                trufa.id.clone(),
                nocciola.id.clone(),
            ])
            .await
            .unwrap();
        assert_eq!(count, 3);

        let today = store.list_flavors_of_the_day().await.unwrap();
        let names: Vec<_> = today.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Amarena", "Nocciola"]);

        store.delete_product(&amarena.id).await.unwrap();
        assert_eq!(store.list_flavors_of_the_day().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_file_persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");

        let store = MemoryStore::open(&path, CatalogData::default()).await.unwrap();
        assert!(path.exists());
        let created = store
            .create_product(new_product("Limone", ProductType::Frozen, None))
            .await
            .unwrap();
        drop(store);

        let reopened = MemoryStore::open(&path, CatalogData::default()).await.unwrap();
        let product = reopened.get_product(&created.id).await.unwrap().unwrap();
        assert_eq!(product.name, "Limone");

        // The id counter is persisted too.
        let next = reopened
            .create_product(new_product("Amarena", ProductType::Frozen, None))
            .await
            .unwrap();
        assert_eq!(next.id.as_str(), "2");
    }

    #[tokio::test]
    async fn test_failed_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        let store = MemoryStore::open(sub.join("catalog.json"), CatalogData::default())
            .await
            .unwrap();

        std::fs::remove_dir_all(&sub).unwrap();
        let err = store
            .create_product(new_product("Limone", ProductType::Frozen, None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));

        let products = store
            .list_products(ProductType::Frozen, &CategoryFilter::All)
            .await
            .unwrap();
        assert!(products.is_empty());
        assert_eq!(store.export().await, CatalogData::default());
    }
}
