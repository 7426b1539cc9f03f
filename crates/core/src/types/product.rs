//! Catalog records: products, categories and the extras the order builder
//! prices against (sizes, boxes, toppings).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id::{BoxId, CategoryId, ProductId, SizeId, ToppingId};
use super::price::Price;

/// The three product lines the shop sells, one per order flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    /// Frozen desserts (gelato). Sold by size with flavor slots.
    #[serde(alias = "gelato")]
    Frozen,
    /// Confectionery (chocolates). Sold per unit or in boxes.
    #[serde(alias = "chocolate")]
    Confection,
    /// Everything else (cones, drinks).
    #[serde(alias = "diversos")]
    Misc,
}

impl ProductType {
    /// All product types, in menu order.
    pub const ALL: [Self; 3] = [Self::Frozen, Self::Confection, Self::Misc];

    /// Canonical wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Frozen => "frozen",
            Self::Confection => "confection",
            Self::Misc => "misc",
        }
    }

    /// Name used by the legacy PHP/MySQL store (`gelato`, `chocolate`, `diversos`).
    #[must_use]
    pub const fn legacy_name(&self) -> &'static str {
        match self {
            Self::Frozen => "gelato",
            Self::Confection => "chocolate",
            Self::Misc => "diversos",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "frozen" | "gelato" => Ok(Self::Frozen),
            "confection" | "chocolate" => Ok(Self::Confection),
            "misc" | "diversos" => Ok(Self::Misc),
            other => Err(format!("invalid product type: {other}")),
        }
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    /// Grouping for display. May dangle after a category is deleted.
    #[serde(default)]
    pub category: Option<CategoryId>,
    #[serde(rename = "type")]
    pub kind: ProductType,
    /// Absolute image URL, or empty when the product has no photo.
    #[serde(default)]
    pub image_url: String,
}

/// A display grouping of products within one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ProductType,
}

/// Category filter for catalog listings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// Every product of the type.
    #[default]
    All,
    /// Only products in this category.
    Id(CategoryId),
}

impl CategoryFilter {
    /// Parse a wire value: missing, empty, `all` or `todos` mean no filter.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("" | "all" | "todos") => Self::All,
            Some(id) => Self::Id(CategoryId::new(id)),
        }
    }

    /// Whether a product passes this filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            Self::All => true,
            Self::Id(id) => product.category.as_ref() == Some(id),
        }
    }
}

/// Frozen-dessert size: how many flavor slots it holds and its base price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeOption {
    pub id: SizeId,
    pub name: String,
    pub unit_count: u32,
    pub price: Price,
}

/// Confection packaging: how many units fit and the box price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxOption {
    pub id: BoxId,
    pub name: String,
    pub unit_count: u32,
    pub price: Price,
}

/// Additive frozen-dessert add-on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topping {
    pub id: ToppingId,
    pub name: String,
    pub price: Price,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(category: Option<&str>) -> Product {
        Product {
            id: ProductId::new("g1"),
            name: "Stracciatella".to_string(),
            description: String::new(),
            price: Price::from_cents(1600),
            category: category.map(CategoryId::new),
            kind: ProductType::Frozen,
            image_url: String::new(),
        }
    }

    #[test]
    fn test_product_type_accepts_legacy_names() {
        assert_eq!("gelato".parse::<ProductType>(), Ok(ProductType::Frozen));
        assert_eq!("Chocolate".parse::<ProductType>(), Ok(ProductType::Confection));
        assert_eq!("diversos".parse::<ProductType>(), Ok(ProductType::Misc));
        assert!("sorvete".parse::<ProductType>().is_err());

        let parsed: ProductType = serde_json::from_str("\"gelato\"").unwrap();
        assert_eq!(parsed, ProductType::Frozen);
    }

    #[test]
    fn test_category_filter_parse() {
        assert_eq!(CategoryFilter::parse(None), CategoryFilter::All);
        assert_eq!(CategoryFilter::parse(Some("todos")), CategoryFilter::All);
        assert_eq!(CategoryFilter::parse(Some("all")), CategoryFilter::All);
        assert_eq!(
            CategoryFilter::parse(Some("classicos")),
            CategoryFilter::Id(CategoryId::new("classicos"))
        );
    }

    #[test]
    fn test_category_filter_matches() {
        let filter = CategoryFilter::Id(CategoryId::new("classicos"));
        assert!(filter.matches(&product(Some("classicos"))));
        assert!(!filter.matches(&product(Some("especiais"))));
        assert!(!filter.matches(&product(None)));
        assert!(CategoryFilter::All.matches(&product(None)));
    }

    #[test]
    fn test_product_serializes_camel_case() {
        let json = serde_json::to_value(product(Some("classicos"))).unwrap();
        assert_eq!(json["type"], "frozen");
        assert_eq!(json["imageUrl"], "");
        assert_eq!(json["price"], "16.00");
    }
}
