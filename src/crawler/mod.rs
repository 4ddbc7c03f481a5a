//! Crawler module for listing retrieval and run orchestration
//!
//! This module contains the request side of the harvester, including:
//! - Request pacing with jittered delays
//! - HTTP fetching with identity rotation, block detection and retries
//! - Pagination across rating buckets
//! - Overall run coordination

mod coordinator;
mod fetcher;
mod pacing;
mod paginator;

pub use coordinator::RunCoordinator;
pub use fetcher::{
    build_http_client, BlockDetector, FetchFailure, FetchOutcome, FetchPolicy, IdentityPool,
    PageFetcher,
};
pub use pacing::{DelayWindow, HostGate, RateLimiter};
pub use paginator::{BucketHarvest, Harvest, Paginator};

use crate::config::Config;
use crate::output::RunStats;
use crate::ScrapeError;

/// Runs a complete harvest
///
/// This is the main entry point for a run. It will:
/// 1. Build the HTTP client, fetchers and extractors
/// 2. Create the output directory tree
/// 3. Walk every rating bucket's listing pages
/// 4. Optionally fetch full review texts
/// 5. Save the reviews and report the counters
///
/// # Arguments
///
/// * `config` - The validated harvester configuration
///
/// # Returns
///
/// * `Ok(RunStats)` - The run finished; individual failures are counted
/// * `Err(ScrapeError)` - Setup failed before any request was sent
pub async fn harvest(config: &Config) -> Result<RunStats, ScrapeError> {
    RunCoordinator::new(config)?.run().await
}
