//! Search command handler
//!
//! Runs a radius search against the snapshot file and prints one page as JSON.
//! The snapshot is never written.

use crate::config::Config;
use crate::error::Result;
use crate::service::{GeoService, PageRequest};
use crate::store::Database;
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Search command arguments
#[derive(Args)]
pub struct SearchArgs {
    #[command(subcommand)]
    pub target: SearchTarget,
}

#[derive(Subcommand)]
pub enum SearchTarget {
    /// Points within the radius
    Points(QueryArgs),

    /// Messages on points within the radius
    Messages(QueryArgs),
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Center latitude
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Center longitude
    #[arg(long, allow_hyphen_values = true)]
    pub lng: f64,

    /// Radius in kilometers
    #[arg(long, allow_hyphen_values = true)]
    pub radius: f64,

    /// Page number, starting at 1
    #[arg(long)]
    pub page: Option<usize>,

    /// Results per page
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Snapshot file to search (defaults to the configured one)
    #[arg(long)]
    pub data_file: Option<PathBuf>,
}

impl QueryArgs {
    fn page_request(&self) -> PageRequest {
        PageRequest {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Run the search command
pub fn run(args: SearchArgs) -> Result<()> {
    let config = Config::load()?;
    let query_args = match &args.target {
        SearchTarget::Points(q) | SearchTarget::Messages(q) => q,
    };
    let path = match &query_args.data_file {
        Some(path) => path.clone(),
        None => config.data_file()?,
    };

    let db = Database::open(path, config.index.cell_size_deg)?;
    let service = GeoService::new(db, config.search_limits()).read_only();

    println!("{}", search(&service, &args.target)?);
    Ok(())
}

/// Run `target` against `service` and render the page as pretty JSON
fn search(service: &GeoService, target: &SearchTarget) -> Result<String> {
    match target {
        SearchTarget::Points(q) => {
            let query = service.radius_query(Some(q.lat), Some(q.lng), Some(q.radius))?;
            let page = service.search_points(&query, q.page_request())?;
            Ok(serde_json::to_string_pretty(&page)?)
        }
        SearchTarget::Messages(q) => {
            let query = service.radius_query(Some(q.lat), Some(q.lng), Some(q.radius))?;
            let page = service.search_messages(&query, q.page_request())?;
            Ok(serde_json::to_string_pretty(&page)?)
        }
    }
}
