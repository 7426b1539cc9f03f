//! Integration test harness for Gante.
//!
//! Each test spins up the real storefront and admin routers on ephemeral
//! ports, both over one in-memory store seeded with the built-in catalog,
//! and drives them with a cookie-enabled `reqwest` client. No database or
//! external service is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p gante-integration-tests
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use reqwest::Client;
use tokio::task::JoinHandle;

use gante_admin::config::AdminConfig;
use gante_catalog::{MemoryStore, SeedData, StoreClient};
use gante_storefront::config::StorefrontConfig;

/// Identity header value sent on admin requests.
pub const ADMIN_IDENTITY: &str = "ana@ganteartesanal.com.br";

/// Shop number used by the test storefront.
pub const WHATSAPP_NUMBER: &str = "5511999999999";

/// A router served on `127.0.0.1` with an OS-assigned port.
pub struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Bind and serve `app` in the background.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn spawn(app: Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self { addr, handle }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Both services over one shared store.
pub struct TestContext {
    pub store: Arc<dyn StoreClient>,
    pub storefront: TestServer,
    pub admin: TestServer,
    pub client: Client,
}

impl TestContext {
    /// Start both services with the built-in catalog and `vars` layered over
    /// the storefront's required settings.
    ///
    /// # Panics
    ///
    /// Panics if the configuration or the built-in seed is invalid.
    pub async fn with_storefront_vars(vars: &[(&str, &str)]) -> Self {
        let seed = SeedData::builtin().expect("Built-in seed must parse");
        let store: Arc<dyn StoreClient> = Arc::new(MemoryStore::new(seed.into_catalog_data()));

        let mut env: HashMap<String, String> = HashMap::from([
            (
                "STOREFRONT_BASE_URL".to_string(),
                "http://localhost:3000".to_string(),
            ),
            ("WHATSAPP_NUMBER".to_string(), WHATSAPP_NUMBER.to_string()),
        ]);
        env.extend(vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())));
        let storefront_config = StorefrontConfig::from_lookup(|key| env.get(key).cloned())
            .expect("Failed to load storefront config");
        let admin_config =
            AdminConfig::from_lookup(|_| None).expect("Failed to load admin config");

        let storefront = TestServer::spawn(gante_storefront::app(
            gante_storefront::state::AppState::new(storefront_config, Arc::clone(&store)),
        ))
        .await;
        let admin = TestServer::spawn(gante_admin::app(gante_admin::state::AppState::new(
            admin_config,
            Arc::clone(&store),
        )))
        .await;

        Self {
            store,
            storefront,
            admin,
            client: client(),
        }
    }

    /// Start both services with default settings.
    pub async fn new() -> Self {
        Self::with_storefront_vars(&[]).await
    }

    /// An admin request builder with the proxy identity header set.
    #[must_use]
    pub fn admin_request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.admin.url(path))
            .header(gante_admin::config::DEFAULT_AUTH_HEADER, ADMIN_IDENTITY)
    }
}

/// A client that keeps cookies, so the storefront session survives between
/// requests.
///
/// # Panics
///
/// Panics if the TLS backend cannot initialize.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}
