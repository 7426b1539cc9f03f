//! Client for the legacy PHP REST API (`products.php`, `categories.php`,
//! `extras.php`).
//!
//! The PHP side speaks the legacy type names (`gelato`, `chocolate`,
//! `diversos`) and returns raw MySQL rows, which are normalized by
//! [`crate::rows`]. Sizes, boxes and toppings are read-only there.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde_json::{Value, json};
use tracing::{debug, error, instrument, warn};
use url::Url;

use gante_core::{
    BoxId, BoxOption, Category, CategoryFilter, CategoryId, Product, ProductId, ProductType,
    SizeId, SizeOption, Topping, ToppingId,
};

use crate::client::{CategoryPatch, NewCategory, NewProduct, ProductPatch, StoreClient};
use crate::error::StoreError;
use crate::rows::{
    box_from_row, category_from_row, product_from_row, size_from_row, topping_from_row,
};

const PRODUCTS: &str = "products.php";
const CATEGORIES: &str = "categories.php";
const EXTRAS: &str = "extras.php";

/// `StoreClient` over the PHP API.
pub struct HttpStore {
    client: reqwest::Client,
    api_base: Url,
    site_base: Option<Url>,
}

impl HttpStore {
    /// Create a client for the API rooted at `api_base` (e.g.
    /// `https://ganteartesanal.com.br/api/`).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the HTTP client cannot be built.
    pub fn new(
        api_base: &Url,
        site_base: Option<Url>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        // Url::join drops the last segment unless the path ends with '/'.
        let mut api_base = api_base.clone();
        if !api_base.path().ends_with('/') {
            let path = format!("{}/", api_base.path());
            api_base.set_path(&path);
        }

        Ok(Self {
            client,
            api_base,
            site_base,
        })
    }

    fn endpoint(&self, script: &str, query: &[(&str, &str)]) -> Result<Url, StoreError> {
        let mut url = self
            .api_base
            .join(script)
            .map_err(|e| StoreError::Unavailable(format!("invalid store URL: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Send a request and decode the JSON body, mapping HTTP status codes to
    /// store errors.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<Value, StoreError> {
        let response = request.header(ACCEPT, "application/json").send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(what.to_string()));
        }
        if status.is_server_error() {
            error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Store API returned server error"
            );
            return Err(StoreError::Unavailable(format!("HTTP {status}")));
        }
        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(StoreError::Conflict(message));
        }

        serde_json::from_str(&body).map_err(|e| {
            error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse store API response"
            );
            StoreError::Unavailable(format!("invalid JSON from store API: {e}"))
        })
    }

    async fn get(&self, script: &str, query: &[(&str, &str)], what: &str) -> Result<Value, StoreError> {
        let url = self.endpoint(script, query)?;
        debug!(url = %url, "GET");
        self.send(self.client.get(url), what).await
    }

    async fn get_rows(&self, script: &str, query: &[(&str, &str)], what: &str) -> Result<Vec<Value>, StoreError> {
        match self.get(script, query, what).await? {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Err(StoreError::malformed(
                "list",
                format!("expected an array of {what}, got {other}"),
            )),
        }
    }

    fn product(&self, row: Value) -> Result<Product, StoreError> {
        product_from_row(row, self.site_base.as_ref())
    }

    /// Normalize every row, dropping the ones that fail with a warning.
    fn collect<T>(
        rows: Vec<Value>,
        normalize: impl Fn(Value) -> Result<T, StoreError>,
    ) -> Vec<T> {
        rows.into_iter()
            .filter_map(|row| match normalize(row) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed row");
                    None
                }
            })
            .collect()
    }

    fn read_only(operation: &'static str) -> StoreError {
        StoreError::Unsupported {
            backend: "http",
            operation,
        }
    }
}

#[async_trait]
impl StoreClient for HttpStore {
    fn backend_name(&self) -> &'static str {
        "http"
    }

    #[instrument(skip(self))]
    async fn ping(&self) -> Result<(), StoreError> {
        match self
            .get(EXTRAS, &[("table", "gelato_sizes")], "sizes")
            .await?
        {
            Value::Array(_) => Ok(()),
            _ => Err(StoreError::Unavailable(
                "store API did not answer with a list".to_string(),
            )),
        }
    }

    #[instrument(skip(self))]
    async fn list_products(
        &self,
        kind: ProductType,
        category: &CategoryFilter,
    ) -> Result<Vec<Product>, StoreError> {
        let mut query = vec![("type", kind.legacy_name())];
        if let CategoryFilter::Id(id) = category {
            query.push(("category", id.as_str()));
        }
        let rows = self.get_rows(PRODUCTS, &query, "products").await?;
        Ok(Self::collect(rows, |row| self.product(row)))
    }

    #[instrument(skip(self))]
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        match self.get(PRODUCTS, &[("id", id.as_str())], "product").await {
            Ok(Value::Null) => Ok(None),
            Ok(row) => self.product(row).map(Some),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, product), fields(name = %product.name))]
    async fn create_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        let body = json!({
            "name": product.name,
            "description": product.description,
            "price": product.price,
            "category": product.category,
            "type": product.kind.legacy_name(),
            "image_url": product.image_url,
        });
        let url = self.endpoint(PRODUCTS, &[])?;
        let row = self.send(self.client.post(url).json(&body), "product").await?;
        self.product(row)
    }

    #[instrument(skip(self, patch))]
    async fn update_product(
        &self,
        id: &ProductId,
        patch: ProductPatch,
    ) -> Result<Product, StoreError> {
        if patch.is_empty() {
            // The API rejects an update with no fields.
            return self
                .get_product(id)
                .await?
                .ok_or_else(|| StoreError::NotFound(format!("product {id}")));
        }

        let mut body = serde_json::Map::new();
        body.insert("id".to_string(), json!(id));
        if let Some(name) = patch.name {
            body.insert("name".to_string(), json!(name));
        }
        if let Some(description) = patch.description {
            body.insert("description".to_string(), json!(description));
        }
        if let Some(price) = patch.price {
            body.insert("price".to_string(), json!(price));
        }
        if let Some(category) = patch.category {
            body.insert("category".to_string(), json!(category));
        }
        if let Some(kind) = patch.kind {
            body.insert("type".to_string(), json!(kind.legacy_name()));
        }
        if let Some(image_url) = patch.image_url {
            body.insert("image_url".to_string(), json!(image_url));
        }

        let url = self.endpoint(PRODUCTS, &[])?;
        let row = self
            .send(self.client.put(url).json(&body), &format!("product {id}"))
            .await?;
        self.product(row)
    }

    #[instrument(skip(self))]
    async fn delete_product(&self, id: &ProductId) -> Result<(), StoreError> {
        let url = self.endpoint(PRODUCTS, &[("id", id.as_str())])?;
        self.send(self.client.delete(url), &format!("product {id}"))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_categories(&self, kind: ProductType) -> Result<Vec<Category>, StoreError> {
        let rows = self
            .get_rows(CATEGORIES, &[("type", kind.legacy_name())], "categories")
            .await?;
        Ok(Self::collect(rows, category_from_row))
    }

    #[instrument(skip(self, category), fields(name = %category.name))]
    async fn create_category(&self, category: NewCategory) -> Result<Category, StoreError> {
        let body = json!({ "name": category.name, "type": category.kind.legacy_name() });
        let url = self.endpoint(CATEGORIES, &[])?;
        let row = self.send(self.client.post(url).json(&body), "category").await?;
        category_from_row(row)
    }

    #[instrument(skip(self, patch))]
    async fn update_category(
        &self,
        id: &CategoryId,
        patch: CategoryPatch,
    ) -> Result<Category, StoreError> {
        let body = json!({ "id": id, "name": patch.name });
        let url = self.endpoint(CATEGORIES, &[])?;
        let row = self
            .send(self.client.put(url).json(&body), &format!("category {id}"))
            .await?;
        category_from_row(row)
    }

    #[instrument(skip(self))]
    async fn delete_category(&self, id: &CategoryId) -> Result<(), StoreError> {
        let url = self.endpoint(CATEGORIES, &[("id", id.as_str())])?;
        self.send(self.client.delete(url), &format!("category {id}"))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_sizes(&self) -> Result<Vec<SizeOption>, StoreError> {
        let rows = self
            .get_rows(EXTRAS, &[("table", "gelato_sizes")], "sizes")
            .await?;
        Ok(Self::collect(rows, size_from_row))
    }

    async fn save_size(&self, _size: SizeOption) -> Result<SizeOption, StoreError> {
        Err(Self::read_only("save_size"))
    }

    async fn delete_size(&self, _id: &SizeId) -> Result<(), StoreError> {
        Err(Self::read_only("delete_size"))
    }

    #[instrument(skip(self))]
    async fn list_boxes(&self) -> Result<Vec<BoxOption>, StoreError> {
        let rows = self
            .get_rows(EXTRAS, &[("table", "chocolate_boxes")], "boxes")
            .await?;
        Ok(Self::collect(rows, box_from_row))
    }

    async fn save_box(&self, _packaging: BoxOption) -> Result<BoxOption, StoreError> {
        Err(Self::read_only("save_box"))
    }

    async fn delete_box(&self, _id: &BoxId) -> Result<(), StoreError> {
        Err(Self::read_only("delete_box"))
    }

    #[instrument(skip(self))]
    async fn list_toppings(&self) -> Result<Vec<Topping>, StoreError> {
        let rows = self
            .get_rows(EXTRAS, &[("table", "toppings")], "toppings")
            .await?;
        Ok(Self::collect(rows, topping_from_row))
    }

    async fn save_topping(&self, _topping: Topping) -> Result<Topping, StoreError> {
        Err(Self::read_only("save_topping"))
    }

    async fn delete_topping(&self, _id: &ToppingId) -> Result<(), StoreError> {
        Err(Self::read_only("delete_topping"))
    }

    #[instrument(skip(self))]
    async fn list_flavors_of_the_day(&self) -> Result<Vec<Product>, StoreError> {
        let rows = self
            .get_rows(EXTRAS, &[("table", "flavors_of_the_day")], "flavors of the day")
            .await?;
        Ok(Self::collect(rows, |row| self.product(row)))
    }

    #[instrument(skip(self))]
    async fn set_flavors_of_the_day(&self, ids: &[ProductId]) -> Result<usize, StoreError> {
        let body = json!({ "table": "flavors_of_the_day", "product_ids": ids });
        let url = self.endpoint(EXTRAS, &[])?;
        let response = self
            .send(self.client.post(url).json(&body), "flavors of the day")
            .await?;
        let count = response
            .get("count")
            .and_then(Value::as_u64)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(ids.len());
        Ok(count)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use axum::Json;
    use axum::Router;
    use axum::extract::Query;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::get;
    use gante_core::Price;
    use tokio::net::TcpListener;

    use super::*;

    async fn products(Query(q): Query<HashMap<String, String>>) -> (AxumStatus, Json<Value>) {
        if let Some(id) = q.get("id") {
            return if id == "7" {
                (
                    AxumStatus::OK,
                    Json(json!({"id": 7, "name": "Pistacchio", "price": "18.00",
                                "type": "gelato", "image_url": "img/p.jpg"})),
                )
            } else {
                (
                    AxumStatus::NOT_FOUND,
                    Json(json!({"error": "Produto nao encontrado."})),
                )
            };
        }
        let mut rows = vec![
            json!({"id": 7, "name": "Pistacchio", "price": "18.00", "category": "1", "type": "gelato"}),
            json!({"id": 8, "name": "Limone", "price": "14.00", "category": "2", "type": "gelato"}),
            json!({"id": 9, "name": "Broken", "type": "gelato", "price": "abc"}),
        ];
        if let Some(category) = q.get("category") {
            rows.retain(|r| r["category"] == json!(category));
        }
        (AxumStatus::OK, Json(Value::Array(rows)))
    }

    async fn create_product(Json(body): Json<Value>) -> (AxumStatus, Json<Value>) {
        if body["type"] != json!("diversos") {
            return (
                AxumStatus::BAD_REQUEST,
                Json(json!({"error": "Campos \"name\" e \"type\" sao obrigatorios."})),
            );
        }
        let mut row = body;
        row["id"] = json!(42);
        (AxumStatus::CREATED, Json(row))
    }

    async fn extras(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
        match q.get("table").map(String::as_str) {
            Some("gelato_sizes") => Json(json!([
                {"id": "pequeno", "name": "Pequeno", "balls": 1, "price": "10.00"},
                {"id": "medio", "name": "Medio", "balls": 2, "price": "16.00"}
            ])),
            Some("chocolate_boxes") => Json(json!([
                {"id": "box6", "name": "Caixa 6", "units": 6, "price": "48.00"}
            ])),
            _ => Json(json!([])),
        }
    }

    async fn spawn_api() -> Url {
        let app = Router::new()
            .route("/api/products.php", get(products).post(create_product))
            .route("/api/extras.php", get(extras));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/api")).unwrap()
    }

    fn store(api: &Url) -> HttpStore {
        let site = Url::parse("https://gante.example/").unwrap();
        HttpStore::new(api, Some(site), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_list_products_normalizes_and_skips_bad_rows() {
        let store = store(&spawn_api().await);
        let all = store
            .list_products(ProductType::Frozen, &CategoryFilter::All)
            .await
            .unwrap();
        let names: Vec<_> = all.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Pistacchio", "Limone"]);

        let filtered = store
            .list_products(ProductType::Frozen, &CategoryFilter::Id(CategoryId::new("2")))
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Limone");
    }

    #[tokio::test]
    async fn test_get_product_maps_404_to_none() {
        let store = store(&spawn_api().await);
        let found = store.get_product(&ProductId::new("7")).await.unwrap().unwrap();
        assert_eq!(found.image_url, "https://gante.example/img/p.jpg");
        assert!(store.get_product(&ProductId::new("99")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_product_sends_legacy_type() {
        let store = store(&spawn_api().await);
        let created = store
            .create_product(NewProduct {
                name: "Agua com Gas".to_string(),
                description: String::new(),
                price: Price::from_cents(500),
                category: None,
                kind: ProductType::Misc,
                image_url: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(created.id.as_str(), "42");
        assert_eq!(created.kind, ProductType::Misc);
        assert_eq!(created.price, Price::from_cents(500));

        let err = store
            .create_product(NewProduct {
                name: "Trufa".to_string(),
                description: String::new(),
                price: Price::ZERO,
                category: None,
                kind: ProductType::Confection,
                image_url: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(message) if message.contains("obrigatorios")));
    }

    #[tokio::test]
    async fn test_extras_and_ping() {
        let store = store(&spawn_api().await);
        store.ping().await.unwrap();

        let sizes = store.list_sizes().await.unwrap();
        assert_eq!(sizes.len(), 2);
        assert_eq!(sizes[1].unit_count, 2);

        let boxes = store.list_boxes().await.unwrap();
        assert_eq!(boxes[0].unit_count, 6);

        assert!(matches!(
            store.save_size(sizes[0].clone()).await,
            Err(StoreError::Unsupported { backend: "http", .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_api_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = Url::parse(&format!("http://{addr}/api/")).unwrap();
        let err = store(&api).ping().await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
