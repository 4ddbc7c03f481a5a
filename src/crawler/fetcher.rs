//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building the HTTP client with timeouts and compression
//! - Rotating browser identities across requests
//! - Pacing every attempt through the rate limiter
//! - Detecting anti-automation pages served with a 2xx status
//! - Bounded retries for blocks and timeouts
//! - Error classification

use crate::config::FetchConfig;
use crate::crawler::pacing::RateLimiter;
use rand::Rng;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, UPGRADE_INSECURE_REQUESTS, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Final classification of one fetch call
#[derive(Debug)]
pub enum FetchOutcome {
    /// A 2xx page without any block marker
    Page {
        /// Page body content
        body: String,
        /// Attempts spent, including the successful one
        attempts: u32,
    },

    /// Every attempt was answered with an anti-automation page
    Blocked {
        /// Attempts spent
        attempts: u32,
    },

    /// The request was abandoned
    Failed(FetchFailure),
}

impl FetchOutcome {
    /// Returns the page body on success
    pub fn into_body(self) -> Option<String> {
        match self {
            FetchOutcome::Page { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Whether the outcome carries a usable page
    pub fn is_page(&self) -> bool {
        matches!(self, FetchOutcome::Page { .. })
    }
}

/// Why a fetch was abandoned
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("rate limited by server (HTTP 429)")]
    RateLimited,

    #[error("access forbidden (HTTP 403)")]
    Forbidden,

    #[error("HTTP error {status}")]
    HttpStatus { status: u16 },

    #[error("request timed out after {attempts} attempts")]
    Timeout { attempts: u32 },

    #[error("network error: {message}")]
    Network { message: String },
}

impl FetchFailure {
    /// Maps a non-success status to a failure
    ///
    /// All of these are final; only the message differs.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::TOO_MANY_REQUESTS => FetchFailure::RateLimited,
            StatusCode::FORBIDDEN => FetchFailure::Forbidden,
            other => FetchFailure::HttpStatus {
                status: other.as_u16(),
            },
        }
    }
}

/// Retry ceiling and cooldowns for one fetch call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchPolicy {
    /// Attempts per call, first one included
    pub max_attempts: u32,

    /// Wait after a block page, on top of the normal pre-request delay
    pub block_cooldown: Duration,

    /// Wait after a timeout, on top of the normal pre-request delay
    pub timeout_cooldown: Duration,
}

impl FetchPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            block_cooldown: Duration::from_secs_f64(config.block_cooldown.max(0.0)),
            timeout_cooldown: Duration::from_secs_f64(config.timeout_cooldown.max(0.0)),
        }
    }
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

/// Fixed pool of browser signatures, handed out round-robin
#[derive(Debug)]
pub struct IdentityPool {
    agents: Vec<String>,
    cursor: AtomicUsize,
}

impl IdentityPool {
    /// Creates a pool starting at a random position
    ///
    /// An empty list falls back to the built-in signatures.
    pub fn new(agents: Vec<String>) -> Self {
        let agents = if agents.is_empty() {
            FetchConfig::default().user_agents
        } else {
            agents
        };
        let start = rand::rng().random_range(0..agents.len());

        Self {
            agents,
            cursor: AtomicUsize::new(start),
        }
    }

    /// Returns the next identity; consecutive calls never repeat unless the
    /// pool holds a single entry
    pub fn next_identity(&self) -> &str {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.agents.len();
        &self.agents[index]
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// Heuristic detector for anti-automation pages
///
/// The marker list is open-ended; sites change their challenge pages and new
/// markers are added through configuration.
#[derive(Debug, Clone)]
pub struct BlockDetector {
    markers: Vec<String>,
}

impl BlockDetector {
    pub fn new(markers: &[String]) -> Self {
        Self {
            markers: markers
                .iter()
                .map(|m| m.trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    /// Returns the first marker found in `body`, compared case-insensitively
    pub fn detect(&self, body: &str) -> Option<&str> {
        if self.markers.is_empty() {
            return None;
        }

        let lowered = body.to_lowercase();
        self.markers
            .iter()
            .find(|marker| lowered.contains(marker.as_str()))
            .map(String::as_str)
    }
}

/// Builds the shared HTTP client
///
/// The user agent is set per request by [`PageFetcher`], not here.
///
/// # Example
///
/// ```no_run
/// use review_harvester::config::FetchConfig;
/// use review_harvester::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs_f64(config.request_timeout.max(0.001));

    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// What a single attempt produced, before retry policy is applied
enum Attempt {
    Body(String),
    Status(StatusCode),
    Timeout,
    Network(String),
}

/// Fetches pages one call at a time with pacing, identity rotation and retries
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    limiter: RateLimiter,
    identities: std::sync::Arc<IdentityPool>,
    detector: BlockDetector,
    policy: FetchPolicy,
    accept_language: String,
}

impl PageFetcher {
    /// Creates a fetcher using `limiter` for pacing and `config` for
    /// identities, block markers and retry policy
    pub fn new(client: Client, limiter: RateLimiter, config: &FetchConfig) -> Self {
        Self {
            client,
            limiter,
            identities: std::sync::Arc::new(IdentityPool::new(config.user_agents.clone())),
            detector: BlockDetector::new(&config.block_markers),
            policy: FetchPolicy::from_config(config),
            accept_language: config.accept_language.clone(),
        }
    }

    /// Fetches a URL with full error handling and retry logic
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx, no block marker | Return the page |
    /// | 2xx with block marker | Retry after block cooldown, then Blocked |
    /// | Timeout | Retry after timeout cooldown, then Failed |
    /// | HTTP 4xx/5xx | Immediate Failed |
    /// | Other network error | Immediate Failed |
    ///
    /// Every attempt, retries included, first waits its turn on the rate
    /// limiter; cooldowns are added on top of that wait.
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        let max_attempts = self.policy.max_attempts;
        let mut attempt = 1;

        loop {
            self.limiter.wait_turn().await;

            tracing::info!(url, attempt, max_attempts, "Fetching page");

            match self.attempt(url).await {
                Attempt::Body(body) => match self.detector.detect(&body) {
                    None => {
                        tracing::info!(url, attempt, bytes = body.len(), "Page fetched");
                        return FetchOutcome::Page {
                            body,
                            attempts: attempt,
                        };
                    }
                    Some(marker) => {
                        tracing::warn!(url, attempt, marker, "Anti-automation page detected");
                        if attempt >= max_attempts {
                            tracing::error!(url, attempts = attempt, "Still blocked, giving up");
                            return FetchOutcome::Blocked { attempts: attempt };
                        }
                        tokio::time::sleep(self.policy.block_cooldown).await;
                    }
                },

                Attempt::Status(status) => {
                    let failure = FetchFailure::from_status(status);
                    tracing::error!(url, attempt, status = status.as_u16(), "{}", failure);
                    return FetchOutcome::Failed(failure);
                }

                Attempt::Timeout => {
                    tracing::warn!(url, attempt, "Request timed out");
                    if attempt >= max_attempts {
                        tracing::error!(url, attempts = attempt, "Timed out on every attempt");
                        return FetchOutcome::Failed(FetchFailure::Timeout { attempts: attempt });
                    }
                    tokio::time::sleep(self.policy.timeout_cooldown).await;
                }

                Attempt::Network(message) => {
                    tracing::error!(url, attempt, error = %message, "Request failed");
                    return FetchOutcome::Failed(FetchFailure::Network { message });
                }
            }

            attempt += 1;
        }
    }

    /// Sends one GET with a fresh identity and reads the body
    async fn attempt(&self, url: &str) -> Attempt {
        let identity = self.identities.next_identity();

        let response = match self
            .client
            .get(url)
            .header(USER_AGENT, identity)
            .header(ACCEPT, ACCEPT_HTML)
            .header(ACCEPT_LANGUAGE, self.accept_language.as_str())
            .header(UPGRADE_INSECURE_REQUESTS, "1")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return classify_error(e),
        };

        let status = response.status();
        if !status.is_success() {
            return Attempt::Status(status);
        }

        match response.text().await {
            Ok(body) => Attempt::Body(body),
            Err(e) => classify_error(e),
        }
    }
}

fn classify_error(error: reqwest::Error) -> Attempt {
    if error.is_timeout() {
        Attempt::Timeout
    } else {
        Attempt::Network(error.to_string())
    }
}
