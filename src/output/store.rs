//! Rating-bucketed review files
//!
//! Layout: `{root}/{rating}/{sequence:04}.txt`, one file per review, with
//! the sequence counted per rating within a run.

use crate::review::{is_valid_rating, Review, RATINGS};
use crate::ScrapeError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

const HEAVY_RULE: &str = "============================================================";
const LIGHT_RULE: &str = "------------------------------------------------------------";

/// Why a review was not written
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("invalid rating {0:?}")]
    InvalidRating(Option<u8>),

    #[error("cannot write {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
}

/// Result of one save call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The review was written to this path
    Saved(PathBuf),

    /// Nothing was written
    Rejected(RejectReason),
}

/// Writes reviews under a rating-bucketed directory tree
#[derive(Debug, Clone)]
pub struct ReviewStore {
    root: PathBuf,
}

impl ReviewStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the root and one directory per rating
    ///
    /// Failure here is fatal: nothing could be stored afterwards.
    pub fn prepare(&self) -> Result<(), ScrapeError> {
        for rating in RATINGS {
            let dir = self.bucket_dir(rating);
            std::fs::create_dir_all(&dir).map_err(|source| ScrapeError::Setup {
                path: dir.clone(),
                source,
            })?;
        }

        tracing::info!(root = %self.root.display(), "Output directory tree ready");
        Ok(())
    }

    /// Directory holding reviews with the given rating
    pub fn bucket_dir(&self, rating: u8) -> PathBuf {
        self.root.join(rating.to_string())
    }

    /// File path for a review's rating and per-rating sequence number
    pub fn path_for(&self, rating: u8, sequence: u32) -> PathBuf {
        self.bucket_dir(rating).join(format!("{:04}.txt", sequence))
    }

    /// Writes `review` as `{rating}/{sequence:04}.txt`
    ///
    /// Ratings outside 1..=5 and I/O errors reject the review; neither
    /// raises. Callers own the uniqueness of (rating, sequence).
    pub fn save(&self, review: &Review, rating: Option<u8>, sequence: u32) -> SaveOutcome {
        let rating = match rating.filter(|r| is_valid_rating(*r)) {
            Some(rating) => rating,
            None => {
                tracing::warn!(
                    rating = ?rating,
                    sequence,
                    "Skipping review with invalid rating: {}",
                    review.title_prefix()
                );
                return SaveOutcome::Rejected(RejectReason::InvalidRating(rating));
            }
        };

        let path = self.path_for(rating, sequence);
        let saved_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let record = render_record(review, rating, &saved_at);

        let written = std::fs::create_dir_all(self.bucket_dir(rating))
            .and_then(|_| std::fs::write(&path, record));

        match written {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Saved review");
                SaveOutcome::Saved(path)
            }
            Err(e) => {
                tracing::error!(path = %path.display(), "Failed to save review: {}", e);
                SaveOutcome::Rejected(RejectReason::Io {
                    path,
                    message: e.to_string(),
                })
            }
        }
    }

    /// Counts stored review files per rating
    pub fn census(&self) -> std::io::Result<BTreeMap<u8, usize>> {
        let mut counts = BTreeMap::new();

        for rating in RATINGS {
            let dir = self.bucket_dir(rating);
            let count = if dir.is_dir() {
                std::fs::read_dir(&dir)?
                    .filter_map(|entry| entry.ok())
                    .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "txt"))
                    .count()
            } else {
                0
            };
            counts.insert(rating, count);
        }

        Ok(counts)
    }
}

/// Formats one review file
pub fn render_record(review: &Review, rating: u8, saved_at: &str) -> String {
    let mut out = String::new();

    out.push_str(HEAVY_RULE);
    out.push('\n');
    out.push_str(&format!("TITLE: {}\n", review.title));
    out.push_str(HEAVY_RULE);
    out.push_str("\n\n");

    out.push_str(&format!("Author: {}\n", review.author));
    out.push_str(&format!("Date: {}\n", review.date));
    out.push_str(&format!("Rating: {} / 5\n", rating));
    if review.has_link() {
        out.push_str(&format!("Link: {}\n", review.link));
    }

    out.push('\n');
    out.push_str(LIGHT_RULE);
    out.push_str("\nREVIEW TEXT:\n");
    out.push_str(LIGHT_RULE);
    out.push_str("\n\n");
    out.push_str(review.body());
    out.push_str("\n\n");

    out.push_str(HEAVY_RULE);
    out.push('\n');
    out.push_str(&format!("Saved: {}\n", saved_at));
    out.push_str(HEAVY_RULE);
    out.push('\n');

    out
}
