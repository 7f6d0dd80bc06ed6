//! Storefront Gateway CLI - Order lookups and configuration checks.
//!
//! # Usage
//!
//! ```bash
//! # Look up an order the way the storefront tracking form does
//! gateway-cli track --order 104276 --email jane@example.com
//!
//! # Show the configuration the gateway would start with
//! gateway-cli config
//! ```
//!
//! # Commands
//!
//! - `track` - Resolve an order against Shopify and print the reply JSON
//! - `config` - Print the loaded configuration with secrets redacted

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(author, version, about = "Storefront Gateway CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up an order's fulfillment and tracking
    Track {
        /// Order number, with or without the leading '#'
        #[arg(short, long)]
        order: String,

        /// Email the order was placed with
        #[arg(short, long)]
        email: String,
    },
    /// Print the loaded configuration (secrets redacted)
    Config,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_gateway=info".into()),
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
        Commands::Track { order, email } => commands::track::run(&order, &email).await?,
        Commands::Config => commands::config::show()?,
    }
    Ok(())
}
