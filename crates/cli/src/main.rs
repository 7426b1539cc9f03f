//! Gante CLI - catalog migrations, seeding and inspection.
//!
//! # Usage
//!
//! ```bash
//! # Create the catalog tables (postgres backend)
//! gante migrate
//!
//! # Load a YAML catalog into the configured store, wiping it first
//! gante seed --file catalog.yaml --clear
//!
//! # Inspect what the storefront would show
//! gante catalog list --type frozen --category classicos
//! gante catalog extras
//! ```
//!
//! The store is chosen the same way the servers choose it (`STORE_BACKEND`
//! and friends, `.env` honored).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use gante_core::ProductType;

mod commands;

#[derive(Parser)]
#[command(name = "gante")]
#[command(author, version, about = "Gante Gelato & Chocolates CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run catalog database migrations (postgres backend)
    Migrate,
    /// Load a catalog from YAML into the configured store
    Seed {
        /// Seed file; the built-in catalog when omitted
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Delete the current catalog first
        #[arg(long)]
        clear: bool,
    },
    /// Inspect the catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List products of one type
    List {
        /// frozen, confection or misc (gelato, chocolate and diversos also work)
        #[arg(short, long = "type")]
        kind: ProductType,

        /// Category id; every category when omitted
        #[arg(short, long)]
        category: Option<String>,
    },
    /// List sizes, boxes, toppings and the flavors of the day
    Extras,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gante_cli=info,gante_catalog=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file, clear } => commands::seed::run(file.as_deref(), clear).await?,
        Commands::Catalog { action } => match action {
            CatalogAction::List { kind, category } => {
                commands::catalog::list(kind, category.as_deref()).await?;
            }
            CatalogAction::Extras => commands::catalog::extras().await?,
        },
    }
    Ok(())
}
