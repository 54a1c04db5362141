//! geo-board CLI entry point
//!
//! Location-based points and messages with radius search

use geo_board::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
