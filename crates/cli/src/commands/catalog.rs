//! Catalog inspection: what the storefront would show right now.

use std::fmt::Write;

use gante_catalog::{CatalogReader, connect};
use gante_core::{
    BoxOption, CategoryFilter, CurrencyCode, Product, ProductType, SizeOption, Topping,
};

/// Print products of one type, optionally one category.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the store cannot be
/// opened. A store that fails to answer prints nothing.
pub async fn list(kind: ProductType, category: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let reader = CatalogReader::new(connect(&super::store_config()?).await?);
    let filter = CategoryFilter::parse(category);
    let products = reader.list_products_by_category(kind, &filter).await;
    super::emit(&format_products(&products, CurrencyCode::default()))?;
    Ok(())
}

/// Print sizes, boxes, toppings and the flavors of the day.
///
/// # Errors
///
/// See [`list`].
pub async fn extras() -> Result<(), Box<dyn std::error::Error>> {
    let reader = CatalogReader::new(connect(&super::store_config()?).await?);
    let (sizes, boxes, toppings, flavors) = tokio::join!(
        reader.list_sizes(),
        reader.list_boxes(),
        reader.list_toppings(),
        reader.list_flavors_of_the_day(),
    );
    super::emit(&format_extras(
        &sizes,
        &boxes,
        &toppings,
        &flavors,
        CurrencyCode::default(),
    ))?;
    Ok(())
}

fn format_products(products: &[Product], currency: CurrencyCode) -> String {
    let mut out = String::new();
    for p in products {
        let category = p.category.as_ref().map_or("-", |c| c.as_str());
        let _ = writeln!(
            out,
            "{:<6} {:<32} {:>10}  {category}",
            p.id.as_str(),
            p.name,
            p.price.display(currency)
        );
    }
    let _ = writeln!(out, "{} product(s)", products.len());
    out
}

fn format_extras(
    sizes: &[SizeOption],
    boxes: &[BoxOption],
    toppings: &[Topping],
    flavors: &[Product],
    currency: CurrencyCode,
) -> String {
    let mut out = String::from("Sizes\n");
    for s in sizes {
        let _ = writeln!(
            out,
            "  {:<12} {:<24} {:>2} un  {:>10}",
            s.id.as_str(),
            s.name,
            s.unit_count,
            s.price.display(currency)
        );
    }
    out.push_str("Boxes\n");
    for b in boxes {
        let _ = writeln!(
            out,
            "  {:<12} {:<24} {:>2} un  {:>10}",
            b.id.as_str(),
            b.name,
            b.unit_count,
            b.price.display(currency)
        );
    }
    out.push_str("Toppings\n");
    for t in toppings {
        let _ = writeln!(
            out,
            "  {:<12} {:<24} {:>16}",
            t.id.as_str(),
            t.name,
            t.price.display(currency)
        );
    }
    out.push_str("Flavors of the day\n");
    for f in flavors {
        let _ = writeln!(out, "  {:<12} {}", f.id.as_str(), f.name);
    }
    out
}
