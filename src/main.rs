//! Review Harvester main entry point
//!
//! This is the command-line interface for the review harvester.

use anyhow::Context;
use clap::Parser;
use review_harvester::config::{load_or_default, validate, Config};
use review_harvester::crawler::RunCoordinator;
use review_harvester::output::{print_census, ReviewStore};
use review_harvester::review::RATINGS;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Review Harvester: a patient review-feed scraper
///
/// Walks the rating-filtered listing pages of a review feed, pacing every
/// request, and writes each review to `{output-dir}/{rating}/{NNNN}.txt`.
#[derive(Parser, Debug)]
#[command(name = "review-harvester")]
#[command(version = "1.0.0")]
#[command(about = "Collects reviews into rating-bucketed text files", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Directory receiving the rating folders
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<String>,

    /// Listing page URL of the review feed
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Listing pages to walk per rating
    #[arg(short, long)]
    pages: Option<u32>,

    /// Minimum wait before each listing request (seconds)
    #[arg(long, value_name = "SECS")]
    min_delay: Option<f64>,

    /// Maximum wait before each listing request (seconds)
    #[arg(long, value_name = "SECS")]
    max_delay: Option<f64>,

    /// Attempts per request before giving up
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Fetch each review's detail page for its full text
    #[arg(long)]
    full_text: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show the effective configuration and planned listing URLs without fetching
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Count the reviews already stored in the output directory and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = build_config(&cli).context("Failed to load configuration")?;

    let log_file = cli
        .writes_log_file()
        .then(|| Path::new(&config.output.log_file));
    setup_logging(cli.verbose, cli.quiet, log_file)?;

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_run(&config).await?;
    }

    Ok(())
}

impl Cli {
    /// Only a harvesting run appends to the log file; the offline modes
    /// log to the console alone
    fn writes_log_file(&self) -> bool {
        !self.dry_run && !self.stats
    }
}

/// Loads the config file (or defaults) and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = load_or_default(cli.config.as_deref())?;

    if let Some(dir) = &cli.output_dir {
        config.output.output_dir = dir.clone();
    }
    if let Some(url) = &cli.base_url {
        config.target.base_url = url.clone();
    }
    if let Some(pages) = cli.pages {
        config.target.pages_per_rating = pages;
    }
    if let Some(min) = cli.min_delay {
        config.pacing.min_delay = min;
    }
    if let Some(max) = cli.max_delay {
        config.pacing.max_delay = max;
    }
    if let Some(attempts) = cli.max_attempts {
        config.fetch.max_attempts = attempts;
    }
    if cli.full_text {
        config.output.full_text = true;
    }

    validate(&config)?;
    Ok(config)
}

/// Sets up console output, plus log-file output when `log_file` is given
fn setup_logging(verbose: u8, quiet: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("review_harvester=info,warn"),
            1 => EnvFilter::new("review_harvester=debug,info"),
            2 => EnvFilter::new("review_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Cannot open log file {}", path.display()))?;

            Some(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .init();

    Ok(())
}

/// Handles the --dry-run mode: shows the configuration and planned URLs
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Review Harvester Dry Run ===\n");

    println!("Target:");
    println!("  Base URL: {}", config.target.base_url);
    println!("  Rating parameter: {}", config.target.rating_param);
    println!("  Pages per rating: {}", config.target.pages_per_rating);

    println!("\nPacing:");
    println!(
        "  Listing delay: {:.1}-{:.1}s",
        config.pacing.min_delay, config.pacing.max_delay
    );
    println!(
        "  Detail delay: {:.1}-{:.1}s",
        config.pacing.detail_min_delay, config.pacing.detail_max_delay
    );
    println!(
        "  Page pause: {:.1}-{:.1}s",
        config.pacing.page_pause_min, config.pacing.page_pause_max
    );

    println!("\nFetching:");
    println!("  Max attempts: {}", config.fetch.max_attempts);
    println!("  Request timeout: {:.1}s", config.fetch.request_timeout);
    println!("  Block cooldown: {:.1}s", config.fetch.block_cooldown);
    println!("  Timeout cooldown: {:.1}s", config.fetch.timeout_cooldown);
    println!("  Block markers: {}", config.fetch.block_markers.join(", "));
    println!("  User agents: {}", config.fetch.user_agents.len());

    println!("\nOutput:");
    println!("  Directory: {}", config.output.output_dir);
    println!("  Log file: {}", config.output.log_file);
    println!("  Full text: {}", config.output.full_text);

    let coordinator = RunCoordinator::new(config)?;
    println!("\nListing pages:");
    for rating in RATINGS {
        for page in 1..=config.target.pages_per_rating {
            println!("  {}", coordinator.paginator().page_url(rating, page)?);
        }
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the --stats mode: counts stored reviews per rating
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let store = ReviewStore::new(&config.output.output_dir);
    let counts = store
        .census()
        .with_context(|| format!("Cannot read {}", config.output.output_dir))?;

    print_census(store.root(), &counts);
    Ok(())
}

/// Handles the main harvesting run
async fn handle_run(config: &Config) -> anyhow::Result<()> {
    tracing::info!(
        base_url = %config.target.base_url,
        pages = config.target.pages_per_rating,
        "Harvesting {} pages per rating",
        config.target.pages_per_rating
    );

    let coordinator = RunCoordinator::new(config)?;
    match coordinator.run().await {
        Ok(stats) => {
            tracing::info!(
                saved = stats.saved_reviews,
                "Harvest finished, log written to {}",
                config.output.log_file
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest aborted: {}", e);
            Err(e.into())
        }
    }
}
