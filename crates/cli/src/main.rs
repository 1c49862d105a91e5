//! PenCraft CLI - Database migrations and catalog tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! pencraft-cli migrate
//!
//! # Load the launch catalog into an empty database
//! pencraft-cli seed
//!
//! # List catalog products
//! pencraft-cli products
//! ```
//!
//! # Environment Variables
//!
//! - `PENCRAFT_DATABASE_URL` - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pencraft-cli")]
#[command(author, version, about = "PenCraft CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the catalog with the launch products
    Seed {
        /// Append even if the catalog already has products
        #[arg(long)]
        force: bool,
    },
    /// List catalog products
    Products,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await,
        Commands::Seed { force } => commands::seed::products(force).await,
        Commands::Products => commands::seed::list().await,
    }
}
