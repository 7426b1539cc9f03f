//! JSON views of a visitor's order.

use serde::Serialize;

use gante_core::order::{
    ConfectionFlow, FrozenFlow, MiscFlow, OrderLineItem, OrderPolicy, OrderSession,
};
use gante_core::{CurrencyCode, Price};

/// The whole order as the client sees it.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub policy: OrderPolicy,
    pub frozen: FrozenFlow,
    pub confection: ConfectionFlow,
    pub misc: MiscFlow,
    pub items: Vec<OrderLineItem>,
    pub total: Price,
    /// `total` formatted for display, e.g. `R$ 19,00`.
    pub total_display: String,
}

impl OrderView {
    #[must_use]
    pub fn new(order: &OrderSession, currency: CurrencyCode) -> Self {
        let total = order.total();
        Self {
            policy: order.policy(),
            frozen: order.frozen().clone(),
            confection: order.confection().clone(),
            misc: order.misc().clone(),
            items: order.items().to_vec(),
            total,
            total_display: total.display(currency),
        }
    }
}

/// Result of a selection change that may be refused as a no-op.
#[derive(Debug, Clone, Serialize)]
pub struct Change {
    /// `false` when the change was ignored (flavor cap reached, nothing to
    /// remove).
    pub accepted: bool,
    pub order: OrderView,
}

/// Result of committing a flow.
#[derive(Debug, Clone, Serialize)]
pub struct Committed {
    pub item: OrderLineItem,
    pub order: OrderView,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_order_view() {
        let view = OrderView::new(&OrderSession::default(), CurrencyCode::default());
        assert!(view.items.is_empty());
        assert_eq!(view.total, Price::ZERO);
        assert_eq!(view.total_display, "R$ 0,00");

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["policy"]["flavors"], "exact");
        assert_eq!(json["policy"]["confections"], "per-item");
    }
}
