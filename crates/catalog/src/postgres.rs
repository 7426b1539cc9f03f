//! `PostgreSQL` store.
//!
//! # Schema: `catalog`
//!
//! - `category`, `product` - text ids drawn from `catalog.entity_id_seq`
//! - `size_option`, `box_option`, `topping` - admin-chosen text ids
//! - `flavor_of_the_day` - product ids flagged for today
//!
//! # Migrations
//!
//! Migrations are stored in `crates/catalog/migrations/` and run via:
//! ```bash
//! cargo run -p gante-cli --features postgres -- migrate
//! ```

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::instrument;

use gante_core::{
    BoxId, BoxOption, Category, CategoryFilter, CategoryId, Price, Product, ProductId,
    ProductType, SizeId, SizeOption, Topping, ToppingId,
};

use crate::client::{CategoryPatch, NewCategory, NewProduct, ProductPatch, StoreClient};
use crate::error::StoreError;

/// Embedded catalog migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const PRODUCT_COLUMNS: &str = "id, name, description, price, category, kind, image_url";

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[derive(FromRow)]
struct ProductRecord {
    id: String,
    name: String,
    description: String,
    price: Decimal,
    category: Option<String>,
    kind: String,
    image_url: String,
}

impl TryFrom<ProductRecord> for Product {
    type Error = StoreError;

    fn try_from(r: ProductRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProductId::new(r.id),
            kind: parse_kind("product", &r.kind)?,
            name: r.name,
            description: r.description,
            price: Price::new(r.price),
            category: r.category.map(CategoryId::new),
            image_url: r.image_url,
        })
    }
}

#[derive(FromRow)]
struct CategoryRecord {
    id: String,
    name: String,
    kind: String,
}

impl TryFrom<CategoryRecord> for Category {
    type Error = StoreError;

    fn try_from(r: CategoryRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CategoryId::new(r.id),
            kind: parse_kind("category", &r.kind)?,
            name: r.name,
        })
    }
}

#[derive(FromRow)]
struct UnitRecord {
    id: String,
    name: String,
    unit_count: i32,
    price: Decimal,
}

impl UnitRecord {
    fn unit_count(&self, entity: &'static str) -> Result<u32, StoreError> {
        u32::try_from(self.unit_count).map_err(|e| StoreError::malformed(entity, e))
    }
}

#[derive(FromRow)]
struct ToppingRecord {
    id: String,
    name: String,
    price: Decimal,
}

fn parse_kind(entity: &'static str, kind: &str) -> Result<ProductType, StoreError> {
    kind.parse().map_err(|e| StoreError::malformed(entity, e))
}

fn unit_count_param(count: u32) -> Result<i32, StoreError> {
    i32::try_from(count).map_err(|e| StoreError::malformed("unit count", e))
}

/// Unique violations become `Conflict`; everything else stays a database error.
fn map_db_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err
        && db.is_unique_violation()
    {
        return StoreError::Conflict(db.message().to_string());
    }
    StoreError::Database(err)
}

fn require_deleted(rows: u64, what: String) -> Result<(), StoreError> {
    if rows == 0 {
        return Err(StoreError::NotFound(what));
    }
    Ok(())
}

/// `StoreClient` over a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoreClient for PostgresStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_products(
        &self,
        kind: ProductType,
        category: &CategoryFilter,
    ) -> Result<Vec<Product>, StoreError> {
        let records: Vec<ProductRecord> = match category {
            CategoryFilter::All => {
                sqlx::query_as(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM catalog.product \
                     WHERE kind = $1 ORDER BY created_at, id"
                ))
                .bind(kind.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            CategoryFilter::Id(id) => {
                sqlx::query_as(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM catalog.product \
                     WHERE kind = $1 AND category = $2 ORDER BY created_at, id"
                ))
                .bind(kind.as_str())
                .bind(id)
                .fetch_all(&self.pool)
                .await?
            }
        };
        records.into_iter().map(Product::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let record: Option<ProductRecord> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM catalog.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        record.map(Product::try_from).transpose()
    }

    #[instrument(skip(self, product), fields(name = %product.name))]
    async fn create_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        let record: ProductRecord = sqlx::query_as(&format!(
            "INSERT INTO catalog.product (name, description, price, category, kind, image_url) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.category)
        .bind(product.kind.as_str())
        .bind(&product.image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        record.try_into()
    }

    #[instrument(skip(self, patch))]
    async fn update_product(
        &self,
        id: &ProductId,
        patch: ProductPatch,
    ) -> Result<Product, StoreError> {
        let (set_category, category) = match patch.category {
            Some(category) => (true, category),
            None => (false, None),
        };
        let record: Option<ProductRecord> = sqlx::query_as(&format!(
            "UPDATE catalog.product SET \
                 name = COALESCE($2, name), \
                 description = COALESCE($3, description), \
                 price = COALESCE($4, price), \
                 category = CASE WHEN $5 THEN $6 ELSE category END, \
                 kind = COALESCE($7, kind), \
                 image_url = COALESCE($8, image_url) \
             WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.price)
        .bind(set_category)
        .bind(category)
        .bind(patch.kind.map(|k| k.as_str()))
        .bind(patch.image_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        record
            .ok_or_else(|| StoreError::NotFound(format!("product {id}")))?
            .try_into()
    }

    #[instrument(skip(self))]
    async fn delete_product(&self, id: &ProductId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM catalog.product WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        require_deleted(result.rows_affected(), format!("product {id}"))
    }

    #[instrument(skip(self))]
    async fn list_categories(&self, kind: ProductType) -> Result<Vec<Category>, StoreError> {
        let records: Vec<CategoryRecord> = sqlx::query_as(
            "SELECT id, name, kind FROM catalog.category WHERE kind = $1 ORDER BY created_at, id",
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;
        records.into_iter().map(Category::try_from).collect()
    }

    #[instrument(skip(self, category), fields(name = %category.name))]
    async fn create_category(&self, category: NewCategory) -> Result<Category, StoreError> {
        let record: CategoryRecord = sqlx::query_as(
            "INSERT INTO catalog.category (name, kind) VALUES ($1, $2) RETURNING id, name, kind",
        )
        .bind(&category.name)
        .bind(category.kind.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        record.try_into()
    }

    #[instrument(skip(self, patch))]
    async fn update_category(
        &self,
        id: &CategoryId,
        patch: CategoryPatch,
    ) -> Result<Category, StoreError> {
        let record: Option<CategoryRecord> = sqlx::query_as(
            "UPDATE catalog.category SET name = $2 WHERE id = $1 RETURNING id, name, kind",
        )
        .bind(id)
        .bind(&patch.name)
        .fetch_optional(&self.pool)
        .await?;
        record
            .ok_or_else(|| StoreError::NotFound(format!("category {id}")))?
            .try_into()
    }

    #[instrument(skip(self))]
    async fn delete_category(&self, id: &CategoryId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM catalog.category WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        require_deleted(result.rows_affected(), format!("category {id}"))
    }

    async fn list_sizes(&self) -> Result<Vec<SizeOption>, StoreError> {
        let records: Vec<UnitRecord> = sqlx::query_as(
            "SELECT id, name, unit_count, price FROM catalog.size_option ORDER BY price, id",
        )
        .fetch_all(&self.pool)
        .await?;
        records
            .into_iter()
            .map(|r| {
                Ok(SizeOption {
                    unit_count: r.unit_count("size")?,
                    id: SizeId::new(r.id),
                    name: r.name,
                    price: Price::new(r.price),
                })
            })
            .collect()
    }

    #[instrument(skip(self, size), fields(id = %size.id))]
    async fn save_size(&self, size: SizeOption) -> Result<SizeOption, StoreError> {
        sqlx::query(
            "INSERT INTO catalog.size_option (id, name, unit_count, price) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, \
                 unit_count = EXCLUDED.unit_count, price = EXCLUDED.price",
        )
        .bind(&size.id)
        .bind(&size.name)
        .bind(unit_count_param(size.unit_count)?)
        .bind(size.price)
        .execute(&self.pool)
        .await?;
        Ok(size)
    }

    #[instrument(skip(self))]
    async fn delete_size(&self, id: &SizeId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM catalog.size_option WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        require_deleted(result.rows_affected(), format!("size {id}"))
    }

    async fn list_boxes(&self) -> Result<Vec<BoxOption>, StoreError> {
        let records: Vec<UnitRecord> = sqlx::query_as(
            "SELECT id, name, unit_count, price FROM catalog.box_option ORDER BY unit_count, id",
        )
        .fetch_all(&self.pool)
        .await?;
        records
            .into_iter()
            .map(|r| {
                Ok(BoxOption {
                    unit_count: r.unit_count("box")?,
                    id: BoxId::new(r.id),
                    name: r.name,
                    price: Price::new(r.price),
                })
            })
            .collect()
    }

    #[instrument(skip(self, packaging), fields(id = %packaging.id))]
    async fn save_box(&self, packaging: BoxOption) -> Result<BoxOption, StoreError> {
        sqlx::query(
            "INSERT INTO catalog.box_option (id, name, unit_count, price) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, \
                 unit_count = EXCLUDED.unit_count, price = EXCLUDED.price",
        )
        .bind(&packaging.id)
        .bind(&packaging.name)
        .bind(unit_count_param(packaging.unit_count)?)
        .bind(packaging.price)
        .execute(&self.pool)
        .await?;
        Ok(packaging)
    }

    #[instrument(skip(self))]
    async fn delete_box(&self, id: &BoxId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM catalog.box_option WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        require_deleted(result.rows_affected(), format!("box {id}"))
    }

    async fn list_toppings(&self) -> Result<Vec<Topping>, StoreError> {
        let records: Vec<ToppingRecord> =
            sqlx::query_as("SELECT id, name, price FROM catalog.topping ORDER BY name, id")
                .fetch_all(&self.pool)
                .await?;
        Ok(records
            .into_iter()
            .map(|r| Topping {
                id: ToppingId::new(r.id),
                name: r.name,
                price: Price::new(r.price),
            })
            .collect())
    }

    #[instrument(skip(self, topping), fields(id = %topping.id))]
    async fn save_topping(&self, topping: Topping) -> Result<Topping, StoreError> {
        sqlx::query(
            "INSERT INTO catalog.topping (id, name, price) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, price = EXCLUDED.price",
        )
        .bind(&topping.id)
        .bind(&topping.name)
        .bind(topping.price)
        .execute(&self.pool)
        .await?;
        Ok(topping)
    }

    #[instrument(skip(self))]
    async fn delete_topping(&self, id: &ToppingId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM catalog.topping WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        require_deleted(result.rows_affected(), format!("topping {id}"))
    }

    async fn list_flavors_of_the_day(&self) -> Result<Vec<Product>, StoreError> {
        let records: Vec<ProductRecord> = sqlx::query_as(
            "SELECT p.id, p.name, p.description, p.price, p.category, p.kind, p.image_url \
             FROM catalog.product p \
             JOIN catalog.flavor_of_the_day f ON f.product_id = p.id \
             WHERE p.kind = 'frozen' \
             ORDER BY p.name, p.id",
        )
        .fetch_all(&self.pool)
        .await?;
        records.into_iter().map(Product::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn set_flavors_of_the_day(&self, ids: &[ProductId]) -> Result<usize, StoreError> {
        let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM catalog.flavor_of_the_day")
            .execute(&mut *tx)
            .await?;
        // Unknown ids are dropped rather than failing the whole replacement.
        let inserted = sqlx::query(
            "INSERT INTO catalog.flavor_of_the_day (product_id) \
             SELECT id FROM catalog.product WHERE id = ANY($1) \
             ON CONFLICT DO NOTHING",
        )
        .bind(&ids)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        usize::try_from(inserted.rows_affected()).map_err(|e| StoreError::malformed("count", e))
    }
}
