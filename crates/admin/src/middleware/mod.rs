//! Request extractors and layers for admin.

pub mod auth;

pub use auth::{AdminIdentity, RequireAdminAuth};
