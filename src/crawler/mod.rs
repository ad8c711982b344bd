//! Crawler module for catalog harvesting
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry and encoding recovery
//! - Role-based link extraction
//! - The bounded worker pool and its shutdown gate
//! - Task dispatch and overall run coordination

mod coordinator;
pub mod extractor;
mod fetcher;
mod pool;
mod task;

pub use coordinator::{run_harvest, Harvester};
pub use extractor::{classify_list_href, extract_links, Link, ListLinkKind};
pub use fetcher::{build_http_client, decode_body, FetchError, Fetcher};
pub use pool::WorkerPool;
pub use task::{CrawlTask, PageRole};

use crate::config::Config;
use crate::output::StatsSnapshot;
use crate::HarvestError;

/// Runs a complete harvest
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client, sink and worker pool
/// 2. Fetch the index page and queue every category
/// 3. Walk listings and pagination concurrently, recording detail pages
/// 4. Close the pool and wait for in-flight work to finish
///
/// # Returns
///
/// * `Ok(StatsSnapshot)` - Harvest completed; final counters
/// * `Err(HarvestError)` - Setup failed or the start page was unreachable
pub async fn harvest(config: Config) -> Result<StatsSnapshot, HarvestError> {
    run_harvest(config).await
}
