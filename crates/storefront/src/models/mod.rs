//! Response and session models for the storefront.

pub mod order;
pub mod session;

pub use order::{Change, Committed, OrderView};
pub use session::keys as session_keys;
