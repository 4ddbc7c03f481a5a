//! HTML extraction for listing and detail pages
//!
//! This module contains:
//! - Ordered field strategies shared by both extractors
//! - Listing page extraction into review records
//! - Detail page extraction of the full review body

mod detail;
mod listing;
pub mod strategy;

pub use detail::DetailExtractor;
pub use listing::{ListingExtractor, ListingPage, PAGE_BLOCK_LIMIT};
pub use strategy::{parse_rating, resolve_link, FieldChain, Pick, Strategy};

use thiserror::Error;

/// Extraction errors
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("Review block has no content")]
    EmptyBlock,
}
