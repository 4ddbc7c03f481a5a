//! The review record passed between extraction, enrichment and storage

use std::ops::RangeInclusive;

/// Star ratings a review can carry; also the set of listing buckets
pub const RATINGS: RangeInclusive<u8> = 1..=5;

/// Returns true when `rating` names one of the five rating buckets
pub fn is_valid_rating(rating: u8) -> bool {
    RATINGS.contains(&rating)
}

/// One review as extracted from a listing page
///
/// Every text field carries a displayable value: the extractor substitutes a
/// placeholder whenever the markup lacks it. `link` is the only exception
/// and is empty when no detail URL could be derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    /// Star rating in 1..=5, or `None` when the markup gave nothing usable
    pub rating: Option<u8>,

    /// Review headline
    pub title: String,

    /// Short preview text from the listing page
    pub teaser: String,

    /// Full review body, filled in by detail-page enrichment
    pub full_text: Option<String>,

    /// Post date as rendered by the site
    pub date: String,

    /// Author display name
    pub author: String,

    /// Absolute URL of the detail page, or empty
    pub link: String,
}

impl Review {
    /// Text to persist: the full body when enrichment found one, else the teaser
    pub fn body(&self) -> &str {
        self.full_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .unwrap_or(&self.teaser)
    }

    /// Whether the review can be written to a rating bucket
    pub fn is_storable(&self) -> bool {
        self.rating.map(is_valid_rating).unwrap_or(false)
    }

    /// Whether a detail page can be fetched for this review
    pub fn has_link(&self) -> bool {
        !self.link.is_empty()
    }

    /// First characters of the title, for log lines
    pub fn title_prefix(&self) -> String {
        let prefix: String = self.title.chars().take(30).collect();
        if prefix.len() < self.title.len() {
            format!("{}...", prefix)
        } else {
            prefix
        }
    }
}
