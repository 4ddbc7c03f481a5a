//! Configuration module for Review Harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so running without a file is supported.
//!
//! # Example
//!
//! ```no_run
//! use review_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Writing reviews to: {}", config.output.output_dir);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FetchConfig, OutputConfig, PacingConfig, Placeholders, TargetConfig};

// Re-export parser functions
pub use parser::{load_config, load_or_default, parse_config};
pub use validation::validate;
