//! Committed, priced order lines.

use serde::{Deserialize, Serialize};

use crate::types::{LineItemId, Price, ProductType};

/// One priced entry in the committed order.
///
/// The price is fixed at commit; later catalog edits do not touch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub id: LineItemId,
    #[serde(rename = "type")]
    pub kind: ProductType,
    /// Human-readable summary, reused verbatim in the checkout message.
    pub description: String,
    pub quantity: u32,
    pub price: Price,
}

impl ProductType {
    /// Heading used in line item descriptions.
    #[must_use]
    pub const fn line_label(&self) -> &'static str {
        match self {
            Self::Frozen => "Gelato",
            Self::Confection => "Chocolates",
            Self::Misc => "Diversos",
        }
    }
}
