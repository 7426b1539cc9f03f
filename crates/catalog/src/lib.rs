//! Gante catalog storage.
//!
//! One [`StoreClient`] trait with swappable backends:
//!
//! - [`MemoryStore`]: in-process, optionally persisted to a JSON file
//! - `HttpStore` (feature `http`): the legacy PHP REST API
//! - `PostgresStore` (feature `postgres`): `PostgreSQL` via sqlx
//!
//! [`CatalogReader`] wraps a store for the storefront and turns backend
//! failures into empty results.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod client;
pub mod config;
pub mod error;
pub mod memory;
pub mod reader;
pub mod rows;
pub mod seed;

#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use client::{CategoryPatch, NewCategory, NewProduct, ProductPatch, StoreClient};
pub use config::{StoreBackend, StoreConfig, StoreConfigError, connect};
pub use error::StoreError;
pub use memory::{CatalogData, MemoryStore};
pub use reader::CatalogReader;
pub use seed::{SeedData, SeedReport};
