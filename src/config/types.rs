use serde::Deserialize;

/// Main configuration structure for Review Harvester
///
/// Every section is optional in the TOML file; missing keys take the
/// defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub placeholders: Placeholders,
}

/// Which review feed to walk and how far
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Listing page URL; rating filter and page segment are added to it
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Name of the query parameter selecting the rating bucket
    #[serde(rename = "rating-param")]
    pub rating_param: String,

    /// Number of listing pages to walk per rating bucket
    #[serde(rename = "pages-per-rating")]
    pub pages_per_rating: u32,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: "https://otzovik.com/reviews/sberbank_rossii/".to_string(),
            rating_param: "ratio".to_string(),
            pages_per_rating: 3,
        }
    }
}

/// Delay windows, in seconds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Lower bound of the wait before each listing request
    #[serde(rename = "min-delay")]
    pub min_delay: f64,

    /// Upper bound of the wait before each listing request
    #[serde(rename = "max-delay")]
    pub max_delay: f64,

    /// Lower bound of the wait before each detail-page request
    #[serde(rename = "detail-min-delay")]
    pub detail_min_delay: f64,

    /// Upper bound of the wait before each detail-page request
    #[serde(rename = "detail-max-delay")]
    pub detail_max_delay: f64,

    /// Lower bound of the extra pause between listing pages of one bucket
    #[serde(rename = "page-pause-min")]
    pub page_pause_min: f64,

    /// Upper bound of the extra pause between listing pages of one bucket
    #[serde(rename = "page-pause-max")]
    pub page_pause_max: f64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_delay: 10.0,
            max_delay: 12.0,
            detail_min_delay: 6.0,
            detail_max_delay: 8.0,
            page_pause_min: 8.0,
            page_pause_max: 10.0,
        }
    }
}

/// Request identity, retry and block-detection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Attempts per fetch call, first one included
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: f64,

    /// Extra wait after a block page before retrying (seconds)
    #[serde(rename = "block-cooldown")]
    pub block_cooldown: f64,

    /// Extra wait after a timeout before retrying (seconds)
    #[serde(rename = "timeout-cooldown")]
    pub timeout_cooldown: f64,

    /// Case-insensitive substrings that mark an anti-automation page
    #[serde(rename = "block-markers")]
    pub block_markers: Vec<String>,

    /// Browser signatures rotated across requests
    #[serde(rename = "user-agents")]
    pub user_agents: Vec<String>,

    /// Accept-Language header sent with every request
    #[serde(rename = "accept-language")]
    pub accept_language: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            request_timeout: 30.0,
            block_cooldown: 15.0,
            timeout_cooldown: 5.0,
            block_markers: vec!["captcha".to_string(), "доступ запрещен".to_string()],
            user_agents: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.0 Safari/605.1.15".to_string(),
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/119.0".to_string(),
            ],
            accept_language: "ru-RU,ru;q=0.8,en-US;q=0.5,en;q=0.3".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root of the rating-bucketed review tree
    #[serde(rename = "output-dir")]
    pub output_dir: String,

    /// Log file the binary appends to
    #[serde(rename = "log-file")]
    pub log_file: String,

    /// Fetch each review's detail page for its full text
    #[serde(rename = "full-text")]
    pub full_text: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: "dataset".to_string(),
            log_file: "scraper.log".to_string(),
            full_text: false,
        }
    }
}

/// Texts substituted for fields missing from the listing markup
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Placeholders {
    pub title: String,
    pub teaser: String,
    pub date: String,
    pub author: String,
}

impl Default for Placeholders {
    fn default() -> Self {
        Self {
            title: "Untitled".to_string(),
            teaser: "No review text".to_string(),
            date: "Date not specified".to_string(),
            author: "anonymous".to_string(),
        }
    }
}
