//! CLI command handlers
//!
//! Each subcommand has its own module with handler functions.

pub mod config;
pub mod search;
pub mod serve;

use clap::{Parser, Subcommand};

/// Location-based message board
#[derive(Parser)]
#[command(name = "geo-board")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start web server (foreground)
    Serve(serve::ServeArgs),

    /// Manage configuration
    Config(config::ConfigArgs),

    /// Search the stored points or messages
    Search(search::SearchArgs),
}

/// Run the CLI
pub async fn run() -> crate::error::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => serve::run(args).await,
        Commands::Config(args) => config::run(args),
        Commands::Search(args) => search::run(args),
    }
}
