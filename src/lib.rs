//! Review Harvester: a patient review-feed scraper
//!
//! This crate walks the rating-filtered listing pages of a public review feed,
//! extracts each review listing into a structured record, optionally enriches
//! it with the full text from its detail page, and writes one file per review
//! into a directory tree bucketed by rating.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod review;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for fatal Review Harvester failures
///
/// Per-request, per-block and per-review failures never surface here; they
/// are reported as values by the component that hit them.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cannot prepare output directory {}: {source}", path.display())]
    Setup {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Extraction setup error: {0}")]
    Extract(#[from] extract::ExtractError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{FetchOutcome, PageFetcher, RateLimiter, RunCoordinator};
pub use output::{ReviewStore, RunStats, SaveOutcome};
pub use review::Review;
