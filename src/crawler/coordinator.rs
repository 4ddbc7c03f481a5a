//! Run coordinator - sequences one harvesting run
//!
//! This module wires the run together:
//! - Preparing the output tree before any network activity
//! - Collecting listing pages for every rating bucket
//! - Optionally enriching reviews with their detail-page text
//! - Saving each review with a per-rating sequence number
//! - Counting what was discovered, saved and lost

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, PageFetcher};
use crate::crawler::pacing::{HostGate, RateLimiter};
use crate::crawler::paginator::{Harvest, Paginator};
use crate::extract::strategy::site_origin;
use crate::extract::{DetailExtractor, ListingExtractor};
use crate::output::{ReviewStore, RunStats, SaveOutcome};
use crate::review::is_valid_rating;
use crate::ScrapeError;
use std::collections::BTreeMap;
use url::Url;

/// Orchestrates a full run
#[derive(Debug, Clone)]
pub struct RunCoordinator {
    paginator: Paginator,
    details: Option<DetailExtractor>,
    store: ReviewStore,
}

impl RunCoordinator {
    /// Creates a coordinator from a validated configuration
    ///
    /// Listing and detail fetches share one HTTP client and one host gate.
    pub fn new(config: &Config) -> Result<Self, ScrapeError> {
        let client = build_http_client(&config.fetch)?;
        let base_url = Url::parse(&config.target.base_url)?;
        let gate = HostGate::new();

        let listing_fetcher = PageFetcher::new(
            client.clone(),
            RateLimiter::for_listings(&config.pacing, gate.clone()),
            &config.fetch,
        );
        let extractor = ListingExtractor::new(config.placeholders.clone(), site_origin(&base_url))?;
        let paginator = Paginator::new(listing_fetcher, extractor, &config.target, &config.pacing)?;

        let details = if config.output.full_text {
            let detail_fetcher = PageFetcher::new(
                client,
                RateLimiter::for_details(&config.pacing, gate),
                &config.fetch,
            );
            Some(DetailExtractor::new(detail_fetcher)?)
        } else {
            None
        };

        Ok(Self {
            paginator,
            details,
            store: ReviewStore::new(&config.output.output_dir),
        })
    }

    pub fn store(&self) -> &ReviewStore {
        &self.store
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    /// Runs the whole pipeline
    ///
    /// Only a failure to prepare the output tree is returned as an error;
    /// it happens before any request is sent.
    pub async fn run(&self) -> Result<RunStats, ScrapeError> {
        tracing::info!("============================================================");
        tracing::info!("Review harvest starting");
        tracing::info!("============================================================");

        self.store.prepare()?;

        let mut stats = RunStats::default();
        let mut harvest = self.paginator.harvest_all().await;

        stats.total_reviews = harvest.total_reviews() as u64;
        stats.errors += harvest.skipped_blocks() as u64;
        stats.failed_pages = u64::from(harvest.pages_failed());

        if let Some(details) = &self.details {
            self.enrich(details, &mut harvest, &mut stats).await;
        }

        self.persist(&harvest, &mut stats);

        stats.log_summary(self.store.root());
        Ok(stats)
    }

    /// Replaces teasers with full texts where the detail page provides one
    async fn enrich(&self, details: &DetailExtractor, harvest: &mut Harvest, stats: &mut RunStats) {
        tracing::info!("Fetching full review texts");

        for bucket in &mut harvest.buckets {
            for review in &mut bucket.reviews {
                // Unstorable reviews would be rejected anyway
                if !review.has_link() || !review.is_storable() {
                    continue;
                }

                if let Some(text) = details.extract_full_text(&review.link).await {
                    review.full_text = Some(text);
                    stats.enriched_reviews += 1;
                }
            }
        }
    }

    /// Saves every review into its own rating's directory
    fn persist(&self, harvest: &Harvest, stats: &mut RunStats) {
        tracing::info!("Saving reviews");

        let mut sequences: BTreeMap<u8, u32> = BTreeMap::new();

        for bucket in &harvest.buckets {
            tracing::info!(
                rating = bucket.rating,
                reviews = bucket.reviews.len(),
                "Saving reviews from rating {} listings",
                bucket.rating
            );

            for review in &bucket.reviews {
                let sequence = review
                    .rating
                    .filter(|rating| is_valid_rating(*rating))
                    .map(|rating| {
                        let next = sequences.entry(rating).or_insert(0);
                        *next += 1;
                        *next
                    })
                    .unwrap_or(0);

                match self.store.save(review, review.rating, sequence) {
                    SaveOutcome::Saved(_) => stats.saved_reviews += 1,
                    SaveOutcome::Rejected(reason) => {
                        tracing::warn!("Review rejected ({}): {}", reason, review.title_prefix());
                        stats.errors += 1;
                    }
                }
            }
        }
    }
}
