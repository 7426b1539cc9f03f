//! Row normalization.
//!
//! Backends hand back loosely typed rows: ids as integers or strings, prices
//! as `"16.00"` or `16`, snake_case or camelCase keys, and the unit count of a
//! size or box under `balls`, `units`, `slots` or `unitCount` depending on
//! which table it came from. One function per entity turns such a row into the
//! canonical record or a [`StoreError::Malformed`].

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use gante_core::{
    BoxOption, Category, CategoryId, Price, Product, ProductId, ProductType, SizeOption, Topping,
};

use crate::error::StoreError;

/// An id that may arrive as a number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LooseId {
    Int(i64),
    Str(String),
}

impl LooseId {
    fn into_string(self) -> String {
        match self {
            Self::Int(id) => id.to_string(),
            Self::Str(id) => id.trim().to_string(),
        }
    }
}

/// A number that may arrive as a JSON number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Num(serde_json::Number),
    Str(String),
}

impl LooseNumber {
    fn to_decimal(&self) -> Result<Decimal, String> {
        let text = match self {
            Self::Num(n) => n.to_string(),
            Self::Str(s) => s.trim().to_string(),
        };
        Decimal::from_str(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .map_err(|e| format!("invalid number {text:?}: {e}"))
    }
}

#[derive(Debug, Deserialize)]
struct ProductRow {
    id: LooseId,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    price: Option<LooseNumber>,
    #[serde(default, alias = "category_id", alias = "categoryId")]
    category: Option<LooseId>,
    #[serde(rename = "type", alias = "kind")]
    kind: String,
    #[serde(default, alias = "imageUrl")]
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CategoryRow {
    id: LooseId,
    name: String,
    #[serde(rename = "type", alias = "kind")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct UnitRow {
    id: LooseId,
    name: String,
    #[serde(alias = "balls", alias = "units", alias = "slots", alias = "unitCount")]
    unit_count: LooseNumber,
    #[serde(default)]
    price: Option<LooseNumber>,
}

#[derive(Debug, Deserialize)]
struct ToppingRow {
    id: LooseId,
    name: String,
    #[serde(default)]
    price: Option<LooseNumber>,
}

fn parse_row<T: DeserializeOwned>(
    entity: &'static str,
    row: serde_json::Value,
) -> Result<T, StoreError> {
    serde_json::from_value(row).map_err(|e| StoreError::malformed(entity, e))
}

fn parse_price(entity: &'static str, price: Option<&LooseNumber>) -> Result<Price, StoreError> {
    let amount = match price {
        Some(price) => price
            .to_decimal()
            .map_err(|e| StoreError::malformed(entity, e))?,
        None => Decimal::ZERO,
    };
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(StoreError::malformed(entity, format!("negative price {amount}")));
    }
    Ok(Price::new(amount))
}

fn parse_kind(entity: &'static str, kind: &str) -> Result<ProductType, StoreError> {
    kind.parse().map_err(|e| StoreError::malformed(entity, e))
}

fn parse_unit_count(entity: &'static str, count: &LooseNumber) -> Result<u32, StoreError> {
    let value = count
        .to_decimal()
        .map_err(|e| StoreError::malformed(entity, e))?;
    value
        .to_u32()
        .filter(|n| *n >= 1 && Decimal::from(*n) == value)
        .ok_or_else(|| StoreError::malformed(entity, format!("invalid unit count {value}")))
}

/// Make a stored image path absolute.
///
/// `http:`, `https:` and `data:` URLs pass through, empty stays empty, and
/// anything else is resolved against `base`. Without a base the path is
/// returned as stored.
#[must_use]
pub fn absolutize_image_url(raw: &str, base: Option<&Url>) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    let lower = raw.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("data:")
    {
        return raw.to_string();
    }
    match base {
        Some(base) => base
            .join(raw)
            .map_or_else(|_| raw.to_string(), |url| url.to_string()),
        None => raw.to_string(),
    }
}

/// Normalize one product row.
///
/// # Errors
///
/// Returns `StoreError::Malformed` when a required field is missing or
/// unparseable.
pub fn product_from_row(row: serde_json::Value, base: Option<&Url>) -> Result<Product, StoreError> {
    let row: ProductRow = parse_row("product", row)?;
    let category = row
        .category
        .map(LooseId::into_string)
        .filter(|id| !id.is_empty())
        .map(CategoryId::new);
    Ok(Product {
        id: ProductId::new(row.id.into_string()),
        price: parse_price("product", row.price.as_ref())?,
        kind: parse_kind("product", &row.kind)?,
        name: row.name,
        description: row.description.unwrap_or_default(),
        category,
        image_url: absolutize_image_url(row.image_url.as_deref().unwrap_or_default(), base),
    })
}

/// Normalize one category row.
///
/// # Errors
///
/// Returns `StoreError::Malformed` for an unparseable row.
pub fn category_from_row(row: serde_json::Value) -> Result<Category, StoreError> {
    let row: CategoryRow = parse_row("category", row)?;
    Ok(Category {
        id: CategoryId::new(row.id.into_string()),
        kind: parse_kind("category", &row.kind)?,
        name: row.name,
    })
}

/// Normalize one size row (`balls` in the legacy schema).
///
/// # Errors
///
/// Returns `StoreError::Malformed` for an unparseable row or a unit count
/// below one.
pub fn size_from_row(row: serde_json::Value) -> Result<SizeOption, StoreError> {
    let row: UnitRow = parse_row("size", row)?;
    Ok(SizeOption {
        id: row.id.into_string().into(),
        unit_count: parse_unit_count("size", &row.unit_count)?,
        price: parse_price("size", row.price.as_ref())?,
        name: row.name,
    })
}

/// Normalize one box row (`units` in the legacy schema).
///
/// # Errors
///
/// Returns `StoreError::Malformed` for an unparseable row or a unit count
/// below one.
pub fn box_from_row(row: serde_json::Value) -> Result<BoxOption, StoreError> {
    let row: UnitRow = parse_row("box", row)?;
    Ok(BoxOption {
        id: row.id.into_string().into(),
        unit_count: parse_unit_count("box", &row.unit_count)?,
        price: parse_price("box", row.price.as_ref())?,
        name: row.name,
    })
}

/// Normalize one topping row.
///
/// # Errors
///
/// Returns `StoreError::Malformed` for an unparseable row.
pub fn topping_from_row(row: serde_json::Value) -> Result<Topping, StoreError> {
    let row: ToppingRow = parse_row("topping", row)?;
    Ok(Topping {
        id: row.id.into_string().into(),
        price: parse_price("topping", row.price.as_ref())?,
        name: row.name,
    })
}
