//! Listing pagination across rating buckets
//!
//! For each rating 1..=5 the paginator walks the configured number of
//! listing pages, pausing between pages of a bucket on top of the fetcher's
//! own pre-request delay, and collects the reviews each page yields.

use crate::config::{PacingConfig, TargetConfig};
use crate::crawler::fetcher::{FetchOutcome, PageFetcher};
use crate::crawler::pacing::DelayWindow;
use crate::extract::ListingExtractor;
use crate::review::{Review, RATINGS};
use crate::ScrapeError;
use url::Url;

/// Reviews collected for one rating bucket
#[derive(Debug, Clone, Default)]
pub struct BucketHarvest {
    /// Rating used as the listing filter
    pub rating: u8,

    /// Reviews in page order, then document order
    pub reviews: Vec<Review>,

    /// Pages that produced a usable body
    pub pages_fetched: u32,

    /// Pages abandoned as blocked or failed
    pub pages_failed: u32,

    /// Review blocks skipped during extraction
    pub skipped_blocks: usize,
}

/// Reviews collected across all buckets
#[derive(Debug, Clone, Default)]
pub struct Harvest {
    pub buckets: Vec<BucketHarvest>,
}

impl Harvest {
    /// Reviews discovered across all buckets
    pub fn total_reviews(&self) -> usize {
        self.buckets.iter().map(|b| b.reviews.len()).sum()
    }

    pub fn pages_failed(&self) -> u32 {
        self.buckets.iter().map(|b| b.pages_failed).sum()
    }

    pub fn skipped_blocks(&self) -> usize {
        self.buckets.iter().map(|b| b.skipped_blocks).sum()
    }
}

/// Drives listing fetches and extraction over buckets and pages
#[derive(Debug, Clone)]
pub struct Paginator {
    fetcher: PageFetcher,
    extractor: ListingExtractor,
    base_url: Url,
    rating_param: String,
    pages_per_rating: u32,
    page_pause: DelayWindow,
}

impl Paginator {
    pub fn new(
        fetcher: PageFetcher,
        extractor: ListingExtractor,
        target: &TargetConfig,
        pacing: &PacingConfig,
    ) -> Result<Self, ScrapeError> {
        let mut base_url = Url::parse(&target.base_url)?;
        base_url.set_fragment(None);
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            fetcher,
            extractor,
            base_url,
            rating_param: target.rating_param.clone(),
            pages_per_rating: target.pages_per_rating,
            page_pause: DelayWindow::from_secs(pacing.page_pause_min, pacing.page_pause_max),
        })
    }

    /// Listing URL for one rating bucket and 1-based page number
    ///
    /// Page 1 is the base URL itself; later pages add a `{page}/` segment.
    pub fn page_url(&self, rating: u8, page: u32) -> Result<Url, ScrapeError> {
        let mut url = if page <= 1 {
            self.base_url.clone()
        } else {
            self.base_url.join(&format!("{}/", page))?
        };

        url.query_pairs_mut()
            .append_pair(&self.rating_param, &rating.to_string());

        Ok(url)
    }

    /// Walks every rating bucket in order
    pub async fn harvest_all(&self) -> Harvest {
        let mut harvest = Harvest::default();
        let mut running_total = 0;

        for rating in RATINGS {
            let bucket = self.harvest_bucket(rating).await;
            running_total += bucket.reviews.len();

            tracing::info!(
                rating,
                reviews = bucket.reviews.len(),
                pages_fetched = bucket.pages_fetched,
                pages_failed = bucket.pages_failed,
                running_total,
                "Rating {}: collected {} reviews from {} pages",
                rating,
                bucket.reviews.len(),
                bucket.pages_fetched
            );

            harvest.buckets.push(bucket);
        }

        tracing::info!(total = running_total, "Total reviews collected: {}", running_total);
        harvest
    }

    /// Walks the listing pages of one rating bucket
    pub async fn harvest_bucket(&self, rating: u8) -> BucketHarvest {
        tracing::info!(rating, "Collecting reviews rated {}", rating);

        let mut bucket = BucketHarvest {
            rating,
            ..BucketHarvest::default()
        };

        for page in 1..=self.pages_per_rating {
            match self.page_url(rating, page) {
                Ok(url) => {
                    tracing::info!(
                        rating,
                        page,
                        pages = self.pages_per_rating,
                        url = %url,
                        "Listing page {}/{}",
                        page,
                        self.pages_per_rating
                    );

                    match self.fetcher.fetch(url.as_str()).await {
                        FetchOutcome::Page { body, .. } => {
                            let listing = self.extractor.extract(&body);
                            bucket.pages_fetched += 1;
                            bucket.skipped_blocks += listing.skipped_blocks;
                            bucket.reviews.extend(listing.reviews);
                        }
                        FetchOutcome::Blocked { attempts } => {
                            tracing::warn!(rating, page, attempts, "Listing page blocked");
                            bucket.pages_failed += 1;
                        }
                        FetchOutcome::Failed(failure) => {
                            tracing::warn!(rating, page, "Listing page failed: {}", failure);
                            bucket.pages_failed += 1;
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(rating, page, "Cannot build listing URL: {}", e);
                    bucket.pages_failed += 1;
                }
            }

            if page < self.pages_per_rating {
                let pause = self.page_pause.draw();
                tracing::debug!(pause_secs = pause.as_secs_f64(), "Pausing between listing pages");
                tokio::time::sleep(pause).await;
            }
        }

        bucket
    }
}
