//! Business logic behind the admin handlers.

pub mod catalog;
