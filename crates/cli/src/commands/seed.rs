//! Load a catalog from YAML into the configured store.
//!
//! Writes go through the same `StoreClient` the servers use, so seeding the
//! PHP API or `PostgreSQL` exercises the real write path. The memory backend
//! only keeps the result when `STORE_DATA_FILE` is set.

use std::path::Path;

use tracing::info;

use gante_catalog::{SeedData, StoreBackend, StoreConfig, connect, seed};

/// Seed the store from `file`, or from the built-in catalog.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the file cannot be read or
/// parsed, or the store rejects a write.
pub async fn run(file: Option<&Path>, clear: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::store_config()?;
    check_persistent(&config)?;

    let data = match file {
        Some(path) => {
            info!(path = %path.display(), "Loading seed file");
            SeedData::from_file(path).await?
        }
        None => SeedData::builtin()?,
    };

    let store = connect(&config).await?;
    info!(backend = store.backend_name(), clear, "Seeding catalog");

    let report = seed::apply(store.as_ref(), data, clear).await?;
    info!(
        categories = report.categories,
        products = report.products,
        sizes = report.sizes,
        boxes = report.boxes,
        toppings = report.toppings,
        flavors_of_the_day = report.flavors_of_the_day,
        "Seeding complete"
    );
    Ok(())
}

/// A memory store without a data file would forget the seed on exit.
fn check_persistent(config: &StoreConfig) -> Result<(), String> {
    if config.backend == StoreBackend::Memory && config.data_file.is_none() {
        return Err(
            "the memory backend keeps nothing without STORE_DATA_FILE; set it to seed a file"
                .to_string(),
        );
    }
    Ok(())
}
