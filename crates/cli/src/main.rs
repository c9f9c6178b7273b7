//! DealerDesk CLI - Database migrations and stock seeding.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! dd-cli migrate
//!
//! # Seed the vehicle stock with generated data
//! dd-cli seed --count 150
//!
//! # The daily refresh: wipe the stock and regenerate it
//! dd-cli seed --count 150 --replace
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Fill the vehicle stock with generated data

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "dd-cli")]
#[command(author, version, about = "DealerDesk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the vehicle stock with generated data
    Seed {
        /// Number of vehicles to generate
        #[arg(short, long, default_value_t = 100)]
        count: usize,

        /// Restrict generated vehicles to a single brand
        #[arg(short, long)]
        brand: Option<String>,

        /// Delete the existing stock first
        #[arg(long)]
        replace: bool,
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
        Commands::Seed {
            count,
            brand,
            replace,
        } => {
            commands::seed::run(count, brand.as_deref(), replace).await?;
        }
    }
    Ok(())
}
