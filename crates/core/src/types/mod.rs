//! Core types for the Gante storefront.
//!
//! This module provides type-safe wrappers for catalog entities and money.

pub mod id;
pub mod price;
pub mod product;

pub use id::*;
pub use price::{CurrencyCode, Price};
pub use product::{
    BoxOption, Category, CategoryFilter, Product, ProductType, SizeOption, Topping,
};
