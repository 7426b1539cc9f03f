//! Gante Core - Shared types library.
//!
//! This crate provides the domain shared by every Gante component:
//! - `storefront` - Public catalog and order builder
//! - `admin` - Catalog maintenance API (behind the auth proxy)
//! - `cli` - Command-line tools for migrations, seeding and inspection
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. Catalog storage lives in `gante-catalog`.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices and catalog records
//! - [`order`] - Order session state machine and line item pricing
//! - [`message`] - WhatsApp order message and deep link

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod message;
pub mod order;
pub mod types;

pub use types::*;
