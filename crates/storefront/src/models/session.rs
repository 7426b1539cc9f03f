//! Session-stored state.

/// Session keys.
pub mod keys {
    /// Key for the visitor's in-progress [`OrderSession`](gante_core::order::OrderSession).
    pub const ORDER: &str = "order";
}
