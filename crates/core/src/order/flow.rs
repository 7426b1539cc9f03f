//! In-progress selections for each product line.
//!
//! A flow holds what the customer is building before it becomes a line item.
//! Mutators here enforce the caps that must hold at all times; commit-time
//! rules (exact counts, empty checks) live in [`FrozenFlow::build`] and
//! friends so a failed commit leaves the flow untouched.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use super::error::OrderError;
use super::line_item::OrderLineItem;
use super::policy::{ConfectionPolicy, FlavorPolicy};
use super::snapshot::CatalogSnapshot;
use crate::types::{BoxOption, LineItemId, Price, ProductId, ProductType, SizeOption, ToppingId};

const fn default_quantity() -> u32 {
    1
}

/// Product counts in the order they were first picked.
///
/// Entries are never zero: decrementing to zero removes the key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection(IndexMap<ProductId, u32>);

impl Selection {
    /// Sum of all counts.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.0.values().sum()
    }

    /// Count for one product, zero if absent.
    #[must_use]
    pub fn count(&self, id: &ProductId) -> u32 {
        self.0.get(id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProductId, u32)> {
        self.0.iter().map(|(id, count)| (id, *count))
    }

    fn increment(&mut self, id: ProductId) {
        *self.0.entry(id).or_insert(0) += 1;
    }

    /// Returns `false` when the product was not selected.
    fn decrement(&mut self, id: &ProductId) -> bool {
        let Some(count) = self.0.get_mut(id) else {
            return false;
        };
        if *count > 1 {
            *count -= 1;
        } else {
            self.0.shift_remove(id);
        }
        true
    }

    fn clear(&mut self) {
        self.0.clear();
    }

    /// Resolve every entry against the snapshot.
    ///
    /// Returns the description parts (`Name` or `Name (xN)`) and the sum of
    /// unit price times count.
    fn resolve(&self, snapshot: &CatalogSnapshot) -> Result<(Vec<String>, Price), OrderError> {
        let mut parts = Vec::with_capacity(self.0.len());
        let mut subtotal = Price::ZERO;
        for (id, count) in self.iter() {
            let product = snapshot
                .product(id)
                .ok_or_else(|| OrderError::UnknownProduct(id.clone()))?;
            parts.push(if count > 1 {
                format!("{} (x{count})", product.name)
            } else {
                product.name.clone()
            });
            subtotal += product.price.times(count);
        }
        Ok((parts, subtotal))
    }
}

/// Frozen-dessert builder: a size, flavors up to its slot count, toppings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrozenFlow {
    pub size: Option<SizeOption>,
    pub flavors: Selection,
    pub toppings: IndexSet<ToppingId>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

impl Default for FrozenFlow {
    fn default() -> Self {
        Self {
            size: None,
            flavors: Selection::default(),
            toppings: IndexSet::new(),
            quantity: default_quantity(),
        }
    }
}

impl FrozenFlow {
    /// Slot count of the selected size, zero when none is selected.
    #[must_use]
    pub fn flavor_cap(&self) -> u32 {
        self.size.as_ref().map_or(0, |size| size.unit_count)
    }

    /// Choose a size. Any flavors picked for the previous size are dropped.
    pub fn select_size(&mut self, size: SizeOption) {
        self.size = Some(size);
        self.flavors.clear();
    }

    /// Add one of a flavor. Refused (returns `false`) with no size selected or
    /// when every slot is taken.
    pub fn add_flavor(&mut self, id: ProductId) -> bool {
        if self.size.is_none() || self.flavors.total() >= self.flavor_cap() {
            return false;
        }
        self.flavors.increment(id);
        true
    }

    pub fn remove_flavor(&mut self, id: &ProductId) -> bool {
        self.flavors.decrement(id)
    }

    /// Flip a topping on or off. Returns whether it is now selected.
    pub fn toggle_topping(&mut self, id: ToppingId) -> bool {
        if self.toppings.shift_remove(&id) {
            false
        } else {
            self.toppings.insert(id);
            true
        }
    }

    /// Set how many identical cups to order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::InvalidQuantity` for zero.
    pub fn set_quantity(&mut self, quantity: u32) -> Result<(), OrderError> {
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity);
        }
        self.quantity = quantity;
        Ok(())
    }

    /// Validate and price the current selection without changing it.
    ///
    /// Unit price is the size price plus every selected topping; flavors are
    /// included in the size. The line price is that times the quantity.
    ///
    /// # Errors
    ///
    /// Returns the first rule the selection breaks.
    pub fn build(
        &self,
        policy: FlavorPolicy,
        snapshot: &CatalogSnapshot,
    ) -> Result<OrderLineItem, OrderError> {
        let size = self.size.as_ref().ok_or(OrderError::NoSizeSelected)?;
        let selected = self.flavors.total();
        if selected == 0 {
            return Err(OrderError::NoFlavorsSelected);
        }
        match policy {
            FlavorPolicy::Exact if selected != size.unit_count => {
                return Err(OrderError::FlavorCountMismatch {
                    size: size.name.clone(),
                    expected: size.unit_count,
                    selected,
                });
            }
            FlavorPolicy::UpToCap if selected > size.unit_count => {
                return Err(OrderError::TooManyFlavors {
                    size: size.name.clone(),
                    max: size.unit_count,
                    selected,
                });
            }
            _ => {}
        }
        if self.quantity == 0 {
            return Err(OrderError::InvalidQuantity);
        }

        let (flavor_names, _) = self.flavors.resolve(snapshot)?;
        let mut topping_names = Vec::with_capacity(self.toppings.len());
        let mut topping_total = Price::ZERO;
        for id in &self.toppings {
            let topping = snapshot
                .topping(id)
                .ok_or_else(|| OrderError::UnknownTopping(id.clone()))?;
            topping_names.push(topping.name.as_str());
            topping_total += topping.price;
        }

        let mut description = format!(
            "{} {} - {}",
            ProductType::Frozen.line_label(),
            size.name,
            flavor_names.join(", ")
        );
        if !topping_names.is_empty() {
            description.push_str(" + ");
            description.push_str(&topping_names.join(", "));
        }
        description.push_str(&format!(" (x{})", self.quantity));

        let unit = size.price + topping_total;
        Ok(OrderLineItem {
            id: LineItemId::generate(),
            kind: ProductType::Frozen,
            description,
            quantity: self.quantity,
            price: unit.times(self.quantity),
        })
    }

    /// Clear what was just committed. The size stays so the customer can
    /// build another cup of the same size.
    pub fn clear_after_commit(&mut self) {
        self.flavors.clear();
        self.toppings.clear();
        self.quantity = default_quantity();
    }
}

/// Confection builder. Under [`ConfectionPolicy::PerItem`] counts are free;
/// under [`ConfectionPolicy::Boxed`] a box caps and prices the selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfectionFlow {
    #[serde(rename = "box")]
    pub packaging: Option<BoxOption>,
    pub items: Selection,
    /// How many identical boxes. Only used when boxed.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

impl Default for ConfectionFlow {
    fn default() -> Self {
        Self {
            packaging: None,
            items: Selection::default(),
            quantity: default_quantity(),
        }
    }
}

impl ConfectionFlow {
    /// Choose a box. Units picked for a previous box are dropped.
    pub fn select_box(&mut self, packaging: BoxOption) {
        self.packaging = Some(packaging);
        self.items.clear();
    }

    /// Add one unit. When boxed, refused with no box selected or when the box
    /// is full.
    pub fn add_item(&mut self, id: ProductId, policy: ConfectionPolicy) -> bool {
        if policy == ConfectionPolicy::Boxed {
            let Some(packaging) = &self.packaging else {
                return false;
            };
            if self.items.total() >= packaging.unit_count {
                return false;
            }
        }
        self.items.increment(id);
        true
    }

    pub fn remove_item(&mut self, id: &ProductId) -> bool {
        self.items.decrement(id)
    }

    /// Set how many identical boxes to order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::InvalidQuantity` for zero.
    pub fn set_quantity(&mut self, quantity: u32) -> Result<(), OrderError> {
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity);
        }
        self.quantity = quantity;
        Ok(())
    }

    /// Validate and price the current selection without changing it.
    ///
    /// # Errors
    ///
    /// Returns the first rule the selection breaks.
    pub fn build(
        &self,
        policy: ConfectionPolicy,
        snapshot: &CatalogSnapshot,
    ) -> Result<OrderLineItem, OrderError> {
        match policy {
            ConfectionPolicy::PerItem => {
                if self.items.is_empty() {
                    return Err(OrderError::NothingSelected(ProductType::Confection));
                }
                let (parts, subtotal) = self.items.resolve(snapshot)?;
                Ok(OrderLineItem {
                    id: LineItemId::generate(),
                    kind: ProductType::Confection,
                    description: format!(
                        "{} - {}",
                        ProductType::Confection.line_label(),
                        parts.join(", ")
                    ),
                    quantity: self.items.total(),
                    price: subtotal,
                })
            }
            ConfectionPolicy::Boxed => {
                let packaging = self.packaging.as_ref().ok_or(OrderError::NoBoxSelected)?;
                let selected = self.items.total();
                if selected != packaging.unit_count {
                    return Err(OrderError::BoxCountMismatch {
                        expected: packaging.unit_count,
                        selected,
                    });
                }
                if self.quantity == 0 {
                    return Err(OrderError::InvalidQuantity);
                }
                // Names only; the box price covers the contents.
                let (parts, _) = self.items.resolve(snapshot)?;
                Ok(OrderLineItem {
                    id: LineItemId::generate(),
                    kind: ProductType::Confection,
                    description: format!(
                        "{} ({}un) - {} (x{})",
                        packaging.name,
                        packaging.unit_count,
                        parts.join(", "),
                        self.quantity
                    ),
                    quantity: self.quantity,
                    price: packaging.price.times(self.quantity),
                })
            }
        }
    }

    /// Clear what was just committed. The box stays selected.
    pub fn clear_after_commit(&mut self) {
        self.items.clear();
        self.quantity = default_quantity();
    }
}

/// Miscellaneous items: free quantities, no sizes or boxes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiscFlow {
    pub items: Selection,
}

impl MiscFlow {
    pub fn add_item(&mut self, id: ProductId) {
        self.items.increment(id);
    }

    pub fn remove_item(&mut self, id: &ProductId) -> bool {
        self.items.decrement(id)
    }

    /// Validate and price the current selection without changing it.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NothingSelected` when empty, or
    /// `OrderError::UnknownProduct` for ids missing from the snapshot.
    pub fn build(&self, snapshot: &CatalogSnapshot) -> Result<OrderLineItem, OrderError> {
        if self.items.is_empty() {
            return Err(OrderError::NothingSelected(ProductType::Misc));
        }
        let (parts, subtotal) = self.items.resolve(snapshot)?;
        Ok(OrderLineItem {
            id: LineItemId::generate(),
            kind: ProductType::Misc,
            description: format!("{} - {}", ProductType::Misc.line_label(), parts.join(", ")),
            quantity: self.items.total(),
            price: subtotal,
        })
    }

    pub fn clear_after_commit(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::SizeId;

    fn size(slots: u32) -> SizeOption {
        SizeOption {
            id: SizeId::new("medio"),
            name: "Medio".to_string(),
            unit_count: slots,
            price: Price::from_cents(1600),
        }
    }

    #[test]
    fn test_selection_removes_key_at_zero() {
        let mut selection = Selection::default();
        let id = ProductId::new("g1");
        selection.increment(id.clone());
        selection.increment(id.clone());
        assert_eq!(selection.count(&id), 2);

        assert!(selection.decrement(&id));
        assert!(selection.decrement(&id));
        assert!(selection.is_empty());
        assert!(!selection.decrement(&id));
    }

    #[test]
    fn test_selection_keeps_first_pick_order() {
        let mut selection = Selection::default();
        selection.increment(ProductId::new("g6"));
        selection.increment(ProductId::new("g2"));
        selection.increment(ProductId::new("g6"));
        let order: Vec<_> = selection.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(order, ["g6", "g2"]);
    }

    #[test]
    fn test_add_flavor_requires_size() {
        let mut flow = FrozenFlow::default();
        assert!(!flow.add_flavor(ProductId::new("g1")));
        assert!(flow.flavors.is_empty());
    }

    #[test]
    fn test_add_flavor_refused_at_cap() {
        let mut flow = FrozenFlow::default();
        flow.select_size(size(2));
        assert!(flow.add_flavor(ProductId::new("g1")));
        assert!(flow.add_flavor(ProductId::new("g1")));
        assert!(!flow.add_flavor(ProductId::new("g2")));
        assert_eq!(flow.flavors.total(), 2);
    }

    #[test]
    fn test_select_size_clears_flavors() {
        let mut flow = FrozenFlow::default();
        flow.select_size(size(3));
        flow.add_flavor(ProductId::new("g1"));
        flow.select_size(size(1));
        assert!(flow.flavors.is_empty());
    }

    #[test]
    fn test_toggle_topping() {
        let mut flow = FrozenFlow::default();
        assert!(flow.toggle_topping(ToppingId::new("t4")));
        assert!(!flow.toggle_topping(ToppingId::new("t4")));
        assert!(flow.toppings.is_empty());
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut flow = FrozenFlow::default();
        assert_eq!(flow.set_quantity(0), Err(OrderError::InvalidQuantity));
        assert_eq!(flow.quantity, 1);
    }

    #[test]
    fn test_boxed_add_refused_without_box_or_when_full() {
        let mut flow = ConfectionFlow::default();
        assert!(!flow.add_item(ProductId::new("c1"), ConfectionPolicy::Boxed));
        assert!(flow.add_item(ProductId::new("c1"), ConfectionPolicy::PerItem));

        flow.select_box(BoxOption {
            id: crate::types::BoxId::new("box6"),
            name: "Caixa 6".to_string(),
            unit_count: 1,
            price: Price::from_cents(4800),
        });
        assert!(flow.items.is_empty());
        assert!(flow.add_item(ProductId::new("c1"), ConfectionPolicy::Boxed));
        assert!(!flow.add_item(ProductId::new("c2"), ConfectionPolicy::Boxed));
    }
}
