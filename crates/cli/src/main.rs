//! Storehouse CLI - database migrations and store management.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! sh-cli migrate
//!
//! # Load products and variants from a YAML catalog
//! sh-cli seed catalog.yaml
//!
//! # Create a cart/order status ahead of first use
//! sh-cli status create "Awaiting Pickup"
//!
//! # Pull stock levels from the shipping vendor
//! sh-cli inventory sync
//! sh-cli inventory sync --product 12
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed the catalog from YAML
//! - `status create` - Create a named status
//! - `inventory sync` - Sync vendor stock levels

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sh-cli")]
#[command(author, version, about = "Storehouse CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Seed products and variants from a YAML catalog
    Seed {
        /// Path to the catalog file
        file: String,
    },
    /// Manage cart/order statuses
    Status {
        #[command(subcommand)]
        action: StatusAction,
    },
    /// Shipping vendor inventory
    Inventory {
        #[command(subcommand)]
        action: InventoryAction,
    },
}

#[derive(Subcommand)]
enum StatusAction {
    /// Create a status by name (no-op if it exists)
    Create {
        /// Status name
        name: String,
    },
}

#[derive(Subcommand)]
enum InventoryAction {
    /// Sync stock levels for one product or the whole catalog
    Sync {
        /// Product id (defaults to every product)
        #[arg(short, long)]
        product: Option<i32>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed { file } => commands::seed::catalog(&file).await?,
        Commands::Status { action } => match action {
            StatusAction::Create { name } => commands::status::create(&name).await?,
        },
        Commands::Inventory { action } => match action {
            InventoryAction::Sync { product } => commands::inventory::sync(product).await?,
        },
    }
    Ok(())
}
