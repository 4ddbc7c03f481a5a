//! Run counters and summaries
//!
//! This module provides the per-run counters returned by the coordinator
//! and the end-of-run and dataset summaries built from them.

use std::collections::BTreeMap;
use std::path::Path;

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Reviews extracted from listing pages, storable or not
    pub total_reviews: u64,

    /// Reviews written to disk
    pub saved_reviews: u64,

    /// Skipped blocks plus rejected saves
    pub errors: u64,

    /// Listing pages abandoned as blocked or failed
    pub failed_pages: u64,

    /// Reviews whose full text was fetched from the detail page
    pub enriched_reviews: u64,
}

impl RunStats {
    /// Share of discovered reviews that were saved, in percent
    pub fn success_rate(&self) -> Option<f64> {
        if self.total_reviews == 0 {
            None
        } else {
            Some(self.saved_reviews as f64 / self.total_reviews as f64 * 100.0)
        }
    }

    /// Emits the end-of-run summary
    pub fn log_summary(&self, output_dir: &Path) {
        tracing::info!("============================================================");
        tracing::info!("Run complete");
        tracing::info!("Reviews written under: {}", output_dir.display());
        tracing::info!(total = self.total_reviews, "Reviews discovered: {}", self.total_reviews);
        tracing::info!(saved = self.saved_reviews, "Reviews saved: {}", self.saved_reviews);
        tracing::info!(errors = self.errors, "Errors: {}", self.errors);
        if self.failed_pages > 0 {
            tracing::info!(
                failed_pages = self.failed_pages,
                "Listing pages lost: {}",
                self.failed_pages
            );
        }
        if self.enriched_reviews > 0 {
            tracing::info!("Reviews with full text: {}", self.enriched_reviews);
        }
        if let Some(rate) = self.success_rate() {
            tracing::info!("Success rate: {:.1}%", rate);
        }
        tracing::info!("============================================================");
    }
}

/// Prints a per-rating census of an existing dataset
pub fn print_census(output_dir: &Path, counts: &BTreeMap<u8, usize>) {
    println!("=== Dataset: {} ===\n", output_dir.display());

    let total: usize = counts.values().sum();
    for (rating, count) in counts {
        let percentage = if total > 0 {
            (*count as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        println!("  Rating {}: {} reviews ({:.1}%)", rating, count, percentage);
    }

    println!("\nTotal: {} reviews", total);
}
