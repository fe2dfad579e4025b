use serde::Deserialize;

/// Main configuration structure for Ria-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub http: HttpConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Listing source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the paginated listing; the page number is appended
    /// as a `page` query parameter
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Page number the crawl starts from
    #[serde(rename = "start-page", default = "default_start_page")]
    pub start_page: u32,

    /// Maximum number of detail pages fetched concurrently
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

/// HTTP client and pacing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Total per-request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Maximum fetch attempts before giving up on a URL
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Random delay drawn before every request, in seconds (min, max)
    #[serde(rename = "request-delay-range")]
    pub request_delay_range: (f64, f64),

    /// Random delay between listing pages, in seconds (min, max)
    #[serde(rename = "page-delay-range")]
    pub page_delay_range: (f64, f64),

    /// Multiplier applied to retry backoff delays
    #[serde(rename = "backoff-scale")]
    pub backoff_scale: f64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 25,
            connect_timeout_secs: 10,
            max_retries: 3,
            request_delay_range: (0.8, 2.2),
            page_delay_range: (2.0, 4.5),
            backoff_scale: 1.0,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Settings consumed by the external scheduler that triggers runs
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// IANA timezone name the scheduler interprets its cadence in
    pub timezone: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            timezone: "Europe/Kyiv".to_string(),
        }
    }
}

fn default_start_page() -> u32 {
    1
}

fn default_concurrency() -> usize {
    6
}
