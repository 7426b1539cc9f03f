//! Subcommand implementations.

pub mod catalog;
pub mod migrate;
pub mod seed;

use std::io::Write;

use gante_catalog::StoreConfig;

/// Store settings from the environment, `.env` included.
fn store_config() -> Result<StoreConfig, gante_catalog::StoreConfigError> {
    // Load .env file if present (ignore errors if not found)
    let _ = dotenvy::dotenv();
    StoreConfig::from_env()
}

/// Write command output to stdout. Logs go to stderr.
fn emit(text: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()
}
