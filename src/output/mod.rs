//! Output module for persisting reviews and reporting on runs
//!
//! This module handles:
//! - Writing each review into its rating directory
//! - Counting what a run discovered, saved and lost
//! - Summarising an existing dataset

pub mod stats;
mod store;

pub use stats::{print_census, RunStats};
pub use store::{render_record, RejectReason, ReviewStore, SaveOutcome};
