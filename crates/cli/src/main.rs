//! Moonbox CLI - Database migrations and shop management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! mb-cli migrate
//!
//! # Install a shop directly with an Admin API token
//! mb-cli shop install --shop my-store.myshopify.com --token shpat_...
//!
//! # Revoke a shop's credential
//! mb-cli shop revoke --shop my-store.myshopify.com
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `shop install` - Store an active credential for a shop
//! - `shop revoke` - Clear a shop's credential and sessions

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mb-cli")]
#[command(author, version, about = "Moonbox CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage installed shops
    Shop {
        #[command(subcommand)]
        action: ShopAction,
    },
}

#[derive(Subcommand)]
enum ShopAction {
    /// Install a shop with an Admin API access token
    Install {
        /// Shop domain (e.g. my-store.myshopify.com)
        #[arg(short, long)]
        shop: String,

        /// Admin API access token
        #[arg(short, long)]
        token: String,
    },
    /// Revoke a shop's credential
    Revoke {
        /// Shop domain (e.g. my-store.myshopify.com)
        #[arg(short, long)]
        shop: String,
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Shop { action } => match action {
            ShopAction::Install { shop, token } => {
                commands::shop::install(&shop, &token).await?;
            }
            ShopAction::Revoke { shop } => commands::shop::revoke(&shop).await?,
        },
    }
    Ok(())
}
