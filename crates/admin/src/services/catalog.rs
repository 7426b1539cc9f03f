//! Validated catalog writes.
//!
//! Handlers hand raw request bodies to these functions. Each checks the few
//! rules the catalog has (required fields, non-negative prices, unit counts
//! of at least one), forwards to the [`StoreClient`] and logs the write with
//! the entity id and the staff member who made it.

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument};

use gante_catalog::{
    CategoryPatch, NewCategory, NewProduct, ProductPatch, StoreClient, StoreError,
};
use gante_core::{
    BoxId, BoxOption, Category, CategoryId, Price, Product, ProductId, ProductType, SizeId,
    SizeOption, Topping, ToppingId,
};

/// A write was refused before reaching the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Campo \"{0}\" e obrigatorio.")]
    MissingField(&'static str),

    #[error("O preco nao pode ser negativo.")]
    NegativePrice,

    #[error("A quantidade de unidades deve ser pelo menos 1.")]
    InvalidUnitCount,

    #[error("Nenhum campo para atualizar.")]
    EmptyPatch,

    #[error("O id do corpo ({body}) difere do id do caminho ({path}).")]
    IdMismatch { path: String, body: String },

    #[error("Produto {0} nao e um sabor de gelato.")]
    NotAFlavor(ProductId),
}

/// Errors from a catalog write.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

type Result<T> = std::result::Result<T, CatalogError>;

/// Body for creating or replacing a size or a box.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitOptionInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unit_count: u32,
    #[serde(default)]
    pub price: Price,
}

/// Body for creating or replacing a topping.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToppingInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: Price,
}

// =============================================================================
// Validation
// =============================================================================

fn required_name(name: &str) -> std::result::Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingField("name"));
    }
    Ok(name.to_string())
}

fn non_negative(price: Price) -> std::result::Result<Price, ValidationError> {
    if price.is_negative() {
        return Err(ValidationError::NegativePrice);
    }
    Ok(price)
}

/// Resolve the id from the path (on replace) or the body (on create).
fn resolve_id(
    path: Option<&str>,
    body: Option<&str>,
) -> std::result::Result<String, ValidationError> {
    let body = body.map(str::trim).filter(|id| !id.is_empty());
    match (path, body) {
        (Some(path), Some(body)) if path != body => Err(ValidationError::IdMismatch {
            path: path.to_string(),
            body: body.to_string(),
        }),
        (Some(id), _) | (None, Some(id)) => Ok(id.to_string()),
        (None, None) => Err(ValidationError::MissingField("id")),
    }
}

/// Check a new product and normalize its name.
///
/// # Errors
///
/// Returns `ValidationError` for a blank name or a negative price.
pub fn validate_new_product(
    mut product: NewProduct,
) -> std::result::Result<NewProduct, ValidationError> {
    product.name = required_name(&product.name)?;
    product.price = non_negative(product.price)?;
    Ok(product)
}

/// Check a product update.
///
/// # Errors
///
/// Returns `ValidationError` for an empty patch, a blank name or a negative
/// price.
pub fn validate_product_patch(
    mut patch: ProductPatch,
) -> std::result::Result<ProductPatch, ValidationError> {
    if patch.is_empty() {
        return Err(ValidationError::EmptyPatch);
    }
    if let Some(name) = &patch.name {
        patch.name = Some(required_name(name)?);
    }
    if let Some(price) = patch.price {
        patch.price = Some(non_negative(price)?);
    }
    Ok(patch)
}

/// Build a size from a request body.
///
/// # Errors
///
/// Returns `ValidationError` for a missing id or name, a zero unit count or
/// a negative price.
pub fn size_from_input(
    path_id: Option<&str>,
    input: UnitOptionInput,
) -> std::result::Result<SizeOption, ValidationError> {
    let (id, name, unit_count, price) = unit_option(path_id, input)?;
    Ok(SizeOption {
        id: SizeId::new(id),
        name,
        unit_count,
        price,
    })
}

/// Build a box from a request body.
///
/// # Errors
///
/// Same rules as [`size_from_input`].
pub fn box_from_input(
    path_id: Option<&str>,
    input: UnitOptionInput,
) -> std::result::Result<BoxOption, ValidationError> {
    let (id, name, unit_count, price) = unit_option(path_id, input)?;
    Ok(BoxOption {
        id: BoxId::new(id),
        name,
        unit_count,
        price,
    })
}

fn unit_option(
    path_id: Option<&str>,
    input: UnitOptionInput,
) -> std::result::Result<(String, String, u32, Price), ValidationError> {
    let id = resolve_id(path_id, input.id.as_deref())?;
    let name = required_name(&input.name)?;
    if input.unit_count == 0 {
        return Err(ValidationError::InvalidUnitCount);
    }
    Ok((id, name, input.unit_count, non_negative(input.price)?))
}

/// Build a topping from a request body.
///
/// # Errors
///
/// Returns `ValidationError` for a missing id or name or a negative price.
pub fn topping_from_input(
    path_id: Option<&str>,
    input: ToppingInput,
) -> std::result::Result<Topping, ValidationError> {
    Ok(Topping {
        id: ToppingId::new(resolve_id(path_id, input.id.as_deref())?),
        name: required_name(&input.name)?,
        price: non_negative(input.price)?,
    })
}

// =============================================================================
// Writes
// =============================================================================

#[instrument(skip(store, product))]
pub async fn create_product(
    store: &dyn StoreClient,
    actor: &str,
    product: NewProduct,
) -> Result<Product> {
    let product = store.create_product(validate_new_product(product)?).await?;
    info!(product_id = %product.id, kind = %product.kind, actor, "Product created");
    Ok(product)
}

#[instrument(skip(store, patch))]
pub async fn update_product(
    store: &dyn StoreClient,
    actor: &str,
    id: &ProductId,
    patch: ProductPatch,
) -> Result<Product> {
    let product = store
        .update_product(id, validate_product_patch(patch)?)
        .await?;
    info!(product_id = %product.id, actor, "Product updated");
    Ok(product)
}

#[instrument(skip(store))]
pub async fn delete_product(store: &dyn StoreClient, actor: &str, id: &ProductId) -> Result<()> {
    store.delete_product(id).await?;
    info!(product_id = %id, actor, "Product deleted");
    Ok(())
}

#[instrument(skip(store, category))]
pub async fn create_category(
    store: &dyn StoreClient,
    actor: &str,
    category: NewCategory,
) -> Result<Category> {
    let category = store
        .create_category(NewCategory {
            name: required_name(&category.name)?,
            kind: category.kind,
        })
        .await?;
    info!(category_id = %category.id, kind = %category.kind, actor, "Category created");
    Ok(category)
}

#[instrument(skip(store, patch))]
pub async fn update_category(
    store: &dyn StoreClient,
    actor: &str,
    id: &CategoryId,
    patch: CategoryPatch,
) -> Result<Category> {
    let category = store
        .update_category(
            id,
            CategoryPatch {
                name: required_name(&patch.name)?,
            },
        )
        .await?;
    info!(category_id = %category.id, actor, "Category renamed");
    Ok(category)
}

#[instrument(skip(store))]
pub async fn delete_category(store: &dyn StoreClient, actor: &str, id: &CategoryId) -> Result<()> {
    store.delete_category(id).await?;
    info!(category_id = %id, actor, "Category deleted");
    Ok(())
}

#[instrument(skip(store, size))]
pub async fn save_size(store: &dyn StoreClient, actor: &str, size: SizeOption) -> Result<SizeOption> {
    let size = store.save_size(size).await?;
    info!(size_id = %size.id, price = %size.price, actor, "Size saved");
    Ok(size)
}

#[instrument(skip(store))]
pub async fn delete_size(store: &dyn StoreClient, actor: &str, id: &SizeId) -> Result<()> {
    store.delete_size(id).await?;
    info!(size_id = %id, actor, "Size deleted");
    Ok(())
}

#[instrument(skip(store, packaging))]
pub async fn save_box(
    store: &dyn StoreClient,
    actor: &str,
    packaging: BoxOption,
) -> Result<BoxOption> {
    let packaging = store.save_box(packaging).await?;
    info!(box_id = %packaging.id, price = %packaging.price, actor, "Box saved");
    Ok(packaging)
}

#[instrument(skip(store))]
pub async fn delete_box(store: &dyn StoreClient, actor: &str, id: &BoxId) -> Result<()> {
    store.delete_box(id).await?;
    info!(box_id = %id, actor, "Box deleted");
    Ok(())
}

#[instrument(skip(store, topping))]
pub async fn save_topping(store: &dyn StoreClient, actor: &str, topping: Topping) -> Result<Topping> {
    let topping = store.save_topping(topping).await?;
    info!(topping_id = %topping.id, price = %topping.price, actor, "Topping saved");
    Ok(topping)
}

#[instrument(skip(store))]
pub async fn delete_topping(store: &dyn StoreClient, actor: &str, id: &ToppingId) -> Result<()> {
    store.delete_topping(id).await?;
    info!(topping_id = %id, actor, "Topping deleted");
    Ok(())
}

/// Replace the flavors of the day. Every id must name a frozen product.
#[instrument(skip(store))]
pub async fn set_flavors_of_the_day(
    store: &dyn StoreClient,
    actor: &str,
    ids: Vec<ProductId>,
) -> Result<usize> {
    for id in &ids {
        match store.get_product(id).await? {
            Some(product) if product.kind == ProductType::Frozen => {}
            _ => return Err(ValidationError::NotAFlavor(id.clone()).into()),
        }
    }
    let count = store.set_flavors_of_the_day(&ids).await?;
    info!(
        product_ids = ?ids.iter().map(ProductId::as_str).collect::<Vec<_>>(),
        count,
        actor,
        "Flavors of the day replaced"
    );
    Ok(count)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gante_catalog::{MemoryStore, SeedData};
    use gante_core::CategoryFilter;

    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::new(SeedData::builtin().unwrap().into_catalog_data())
    }

    fn new_product(name: &str, price: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: String::new(),
            price: Price::from_cents(price),
            category: None,
            kind: ProductType::Frozen,
            image_url: String::new(),
        }
    }

    #[test]
    fn test_product_rules() {
        let product = validate_new_product(new_product("  Pistache  ", 1200)).unwrap();
        assert_eq!(product.name, "Pistache");

        assert_eq!(
            validate_new_product(new_product(" ", 1200)).unwrap_err(),
            ValidationError::MissingField("name")
        );
        assert_eq!(
            validate_new_product(new_product("Pistache", -1)).unwrap_err(),
            ValidationError::NegativePrice
        );
        assert_eq!(
            validate_product_patch(ProductPatch::default()).unwrap_err(),
            ValidationError::EmptyPatch
        );
        // A free item is allowed.
        assert!(validate_new_product(new_product("Amostra", 0)).is_ok());
    }

    #[test]
    fn test_unit_option_rules() {
        let input = UnitOptionInput {
            id: None,
            name: "Gigante".to_string(),
            unit_count: 5,
            price: Price::from_cents(3000),
        };

        assert_eq!(
            size_from_input(None, input.clone()).unwrap_err(),
            ValidationError::MissingField("id")
        );

        let size = size_from_input(Some("gigante"), input.clone()).unwrap();
        assert_eq!(size.id, SizeId::new("gigante"));
        assert_eq!(size.unit_count, 5);

        let zero = UnitOptionInput {
            unit_count: 0,
            id: Some("gigante".to_string()),
            ..input.clone()
        };
        assert_eq!(
            box_from_input(None, zero).unwrap_err(),
            ValidationError::InvalidUnitCount
        );

        let mismatch = UnitOptionInput {
            id: Some("outro".to_string()),
            ..input
        };
        assert!(matches!(
            size_from_input(Some("gigante"), mismatch).unwrap_err(),
            ValidationError::IdMismatch { .. }
        ));
    }

    #[test]
    fn test_topping_rules() {
        let topping = topping_from_input(
            None,
            ToppingInput {
                id: Some("t9".to_string()),
                name: "Nutella".to_string(),
                price: Price::from_cents(400),
            },
        )
        .unwrap();
        assert_eq!(topping.id, ToppingId::new("t9"));

        assert_eq!(
            topping_from_input(Some("t9"), ToppingInput::default()).unwrap_err(),
            ValidationError::MissingField("name")
        );
    }

    #[test]
    fn test_messages_are_user_facing() {
        assert_eq!(
            ValidationError::MissingField("name").to_string(),
            "Campo \"name\" e obrigatorio."
        );
    }

    #[tokio::test]
    async fn test_create_update_delete_product() {
        let store = store();
        let created = create_product(&store, "ana@gante", new_product("Pistache", 1200))
            .await
            .unwrap();
        assert_eq!(created.name, "Pistache");

        let patch = ProductPatch {
            price: Some(Price::from_cents(1300)),
            ..ProductPatch::default()
        };
        let updated = update_product(&store, "ana@gante", &created.id, patch)
            .await
            .unwrap();
        assert_eq!(updated.price, Price::from_cents(1300));

        delete_product(&store, "ana@gante", &created.id).await.unwrap();
        assert!(store.get_product(&created.id).await.unwrap().is_none());

        let err = delete_product(&store, "ana@gante", &created.id)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Store(ref e) if e.is_not_found()));
    }

    #[tokio::test]
    async fn test_invalid_write_leaves_store_untouched() {
        let store = store();
        let before = store
            .list_products(ProductType::Frozen, &CategoryFilter::All)
            .await
            .unwrap()
            .len();

        let err = create_product(&store, "ana@gante", new_product("", 1200))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));

        let after = store
            .list_products(ProductType::Frozen, &CategoryFilter::All)
            .await
            .unwrap()
            .len();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_flavors_of_the_day_must_be_frozen() {
        let store = store();
        let err = set_flavors_of_the_day(
            &store,
            "ana@gante",
            vec![ProductId::new("g1"), ProductId::new("c1")],
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Validation(ValidationError::NotAFlavor(ref id)) if id.as_str() == "c1"
        ));

        let count = set_flavors_of_the_day(
            &store,
            "ana@gante",
            vec![ProductId::new("g3"), ProductId::new("g4")],
        )
        .await
        .unwrap();
        assert_eq!(count, 2);
        assert_eq!(store.list_flavors_of_the_day().await.unwrap().len(), 2);
    }
}
