//! Listing page extraction
//!
//! Turns one listing page into the review records it shows, in document
//! order. Missing markup for a field yields that field's placeholder; only a
//! block with no content at all is skipped.

use crate::config::Placeholders;
use crate::extract::strategy::{parse_rating, resolve_link, FieldChain, Strategy};
use crate::extract::ExtractError;
use crate::review::Review;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Class carried by every review container on the listing page
const CONTAINER_CLASS: &str = "item";

/// Status classes of reviews that are published and visible
const VISIBLE_STATUSES: [&str; 2] = ["status4", "status10"];

/// Upper bound on review blocks taken from one page
pub const PAGE_BLOCK_LIMIT: usize = 10;

/// Result of extracting one listing page
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    /// Reviews in document order, including ones without a usable rating
    pub reviews: Vec<Review>,

    /// Blocks that could not be turned into a review
    pub skipped_blocks: usize,

    /// Whether blocks came from the fallback scan
    pub used_fallback: bool,
}

/// Field chains for one review block
#[derive(Debug, Clone)]
struct BlockFields {
    rating: FieldChain,
    title: FieldChain,
    teaser: FieldChain,
    date: FieldChain,
    author: FieldChain,
    link: FieldChain,
}

impl BlockFields {
    fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            // Structured rating metadata first, rendered label second
            rating: FieldChain::new(vec![
                Strategy::attr("[itemprop=ratingValue]", "content")?,
                Strategy::attr("[data-rating]", "data-rating")?,
                Strategy::text(".rating-score")?,
            ]),
            title: FieldChain::new(vec![
                Strategy::text("a.review-title")?,
                Strategy::text(".review-title")?,
            ]),
            teaser: FieldChain::new(vec![
                Strategy::text(".review-teaser")?,
                Strategy::attr("[itemprop=description]", "content")?,
            ]),
            date: FieldChain::new(vec![
                Strategy::text(".review-postdate")?,
                Strategy::attr("[itemprop=datePublished]", "content")?,
            ]),
            author: FieldChain::new(vec![
                Strategy::text("span[itemprop=name]")?,
                Strategy::text(".user-login")?,
            ]),
            link: FieldChain::new(vec![
                Strategy::attr("a.review-title", "href")?,
                Strategy::attr("a.review-btn", "href")?,
            ]),
        })
    }
}

/// Extracts review records from listing pages
#[derive(Debug, Clone)]
pub struct ListingExtractor {
    blocks: Selector,
    containers: Selector,
    fields: BlockFields,
    placeholders: Placeholders,
    origin: Url,
}

impl ListingExtractor {
    /// Creates an extractor resolving relative review links against `origin`
    pub fn new(placeholders: Placeholders, origin: Url) -> Result<Self, ExtractError> {
        let blocks_css = VISIBLE_STATUSES
            .iter()
            .map(|status| format!("div.{}.{}", CONTAINER_CLASS, status))
            .collect::<Vec<_>>()
            .join(", ");
        let containers_css = format!(".{}", CONTAINER_CLASS);

        Ok(Self {
            blocks: parse_selector(&blocks_css)?,
            containers: parse_selector(&containers_css)?,
            fields: BlockFields::new()?,
            placeholders,
            origin,
        })
    }

    /// Extracts every review on the page
    ///
    /// Review blocks are `div`s carrying the container class and a visible
    /// status. When none exist, any element with the container class is
    /// scanned and filtered by status. Either way at most
    /// [`PAGE_BLOCK_LIMIT`] blocks are taken, in document order.
    pub fn extract(&self, html: &str) -> ListingPage {
        let document = Html::parse_document(html);

        let mut blocks: Vec<ElementRef<'_>> = document
            .select(&self.blocks)
            .take(PAGE_BLOCK_LIMIT)
            .collect();
        let used_fallback = blocks.is_empty();

        if used_fallback {
            blocks = document
                .select(&self.containers)
                .filter(|element| has_visible_status(*element))
                .take(PAGE_BLOCK_LIMIT)
                .collect();
        }

        tracing::info!(
            blocks = blocks.len(),
            fallback = used_fallback,
            "Found {} review blocks on page",
            blocks.len()
        );

        let mut page = ListingPage {
            used_fallback,
            ..ListingPage::default()
        };

        for (index, block) in blocks.into_iter().enumerate() {
            match self.extract_block(block) {
                Ok(review) => {
                    tracing::debug!(
                        rating = ?review.rating,
                        "Extracted review: {}",
                        review.title_prefix()
                    );
                    page.reviews.push(review);
                }
                Err(e) => {
                    tracing::warn!(block = index, "Skipping review block: {}", e);
                    page.skipped_blocks += 1;
                }
            }
        }

        tracing::info!(
            reviews = page.reviews.len(),
            skipped = page.skipped_blocks,
            "Extracted {} reviews",
            page.reviews.len()
        );

        page
    }

    /// Builds one review from its block; each field is read independently
    pub fn extract_block(&self, block: ElementRef<'_>) -> Result<Review, ExtractError> {
        let has_text = block.text().any(|text| !text.trim().is_empty());
        let has_elements = block.children().any(|child| child.value().is_element());
        if !has_text && !has_elements {
            return Err(ExtractError::EmptyBlock);
        }

        let fields = &self.fields;
        let placeholders = &self.placeholders;

        let link = fields
            .link
            .first_match(block)
            .and_then(|href| resolve_link(&href, &self.origin))
            .unwrap_or_default();

        Ok(Review {
            rating: fields.rating.first_valid(block, parse_rating),
            title: fields.title.or_placeholder(block, &placeholders.title),
            teaser: fields.teaser.or_placeholder(block, &placeholders.teaser),
            full_text: None,
            date: fields.date.or_placeholder(block, &placeholders.date),
            author: fields.author.or_placeholder(block, &placeholders.author),
            link,
        })
    }
}

fn has_visible_status(element: ElementRef<'_>) -> bool {
    element
        .value()
        .classes()
        .any(|class| VISIBLE_STATUSES.contains(&class))
}

fn parse_selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}
