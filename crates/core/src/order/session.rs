//! A customer's order: three in-progress flows plus committed line items.

use serde::{Deserialize, Serialize};

use super::error::OrderError;
use super::flow::{ConfectionFlow, FrozenFlow, MiscFlow};
use super::line_item::OrderLineItem;
use super::policy::OrderPolicy;
use super::snapshot::CatalogSnapshot;
use crate::types::{BoxOption, LineItemId, Price, ProductId, SizeOption, ToppingId};

/// Everything one visitor has picked so far.
///
/// Plain data with no I/O: the storefront serializes it into the visitor's
/// session between requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSession {
    #[serde(default)]
    policy: OrderPolicy,
    #[serde(default)]
    frozen: FrozenFlow,
    #[serde(default)]
    confection: ConfectionFlow,
    #[serde(default)]
    misc: MiscFlow,
    #[serde(default)]
    items: Vec<OrderLineItem>,
}

impl OrderSession {
    #[must_use]
    pub fn new(policy: OrderPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn policy(&self) -> OrderPolicy {
        self.policy
    }

    #[must_use]
    pub const fn frozen(&self) -> &FrozenFlow {
        &self.frozen
    }

    #[must_use]
    pub const fn confection(&self) -> &ConfectionFlow {
        &self.confection
    }

    #[must_use]
    pub const fn misc(&self) -> &MiscFlow {
        &self.misc
    }

    /// Committed line items in commit order.
    #[must_use]
    pub fn items(&self) -> &[OrderLineItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of committed line prices.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(|item| item.price).sum()
    }

    // Frozen flow

    pub fn select_size(&mut self, size: SizeOption) {
        self.frozen.select_size(size);
    }

    pub fn add_flavor(&mut self, id: ProductId) -> bool {
        self.frozen.add_flavor(id)
    }

    pub fn remove_flavor(&mut self, id: &ProductId) -> bool {
        self.frozen.remove_flavor(id)
    }

    pub fn toggle_topping(&mut self, id: ToppingId) -> bool {
        self.frozen.toggle_topping(id)
    }

    /// # Errors
    ///
    /// Returns `OrderError::InvalidQuantity` for zero.
    pub fn set_frozen_quantity(&mut self, quantity: u32) -> Result<(), OrderError> {
        self.frozen.set_quantity(quantity)
    }

    /// Turn the frozen selection into a line item.
    ///
    /// On success the flavors, toppings and quantity are cleared and the size
    /// is kept. On failure nothing changes.
    ///
    /// # Errors
    ///
    /// Returns the validation failure from [`FrozenFlow::build`].
    pub fn commit_frozen(&mut self, snapshot: &CatalogSnapshot) -> Result<OrderLineItem, OrderError> {
        let item = self.frozen.build(self.policy.flavors, snapshot)?;
        self.frozen.clear_after_commit();
        self.items.push(item.clone());
        Ok(item)
    }

    // Confection flow

    pub fn select_box(&mut self, packaging: BoxOption) {
        self.confection.select_box(packaging);
    }

    pub fn add_confection(&mut self, id: ProductId) -> bool {
        self.confection.add_item(id, self.policy.confections)
    }

    pub fn remove_confection(&mut self, id: &ProductId) -> bool {
        self.confection.remove_item(id)
    }

    /// # Errors
    ///
    /// Returns `OrderError::InvalidQuantity` for zero.
    pub fn set_box_quantity(&mut self, quantity: u32) -> Result<(), OrderError> {
        self.confection.set_quantity(quantity)
    }

    /// Turn the confection selection into a line item.
    ///
    /// # Errors
    ///
    /// Returns the validation failure from [`ConfectionFlow::build`].
    pub fn commit_confection(
        &mut self,
        snapshot: &CatalogSnapshot,
    ) -> Result<OrderLineItem, OrderError> {
        let item = self.confection.build(self.policy.confections, snapshot)?;
        self.confection.clear_after_commit();
        self.items.push(item.clone());
        Ok(item)
    }

    // Misc flow

    pub fn add_misc(&mut self, id: ProductId) {
        self.misc.add_item(id);
    }

    pub fn remove_misc(&mut self, id: &ProductId) -> bool {
        self.misc.remove_item(id)
    }

    /// Turn the misc selection into a line item.
    ///
    /// # Errors
    ///
    /// Returns the validation failure from [`MiscFlow::build`].
    pub fn commit_misc(&mut self, snapshot: &CatalogSnapshot) -> Result<OrderLineItem, OrderError> {
        let item = self.misc.build(snapshot)?;
        self.misc.clear_after_commit();
        self.items.push(item.clone());
        Ok(item)
    }

    // Committed items

    /// Drop a committed line. Returns `false` if no line has this id.
    pub fn remove_item(&mut self, id: &LineItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.id != id);
        self.items.len() != before
    }

    /// Back to an empty order. The policy is kept.
    pub fn reset(&mut self) {
        *self = Self::new(self.policy);
    }
}
