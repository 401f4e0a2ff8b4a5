use serde::Deserialize;
use std::time::Duration;

/// Start page of the shop the built-in extraction rules are tuned for
pub const DEFAULT_START_URL: &str = "https://scrapeme.live/shop/";

/// Default CSV output path
pub const DEFAULT_CSV_PATH: &str = "products.csv";

/// Desktop browser user agents rotated across requests
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
];

/// Main configuration structure for Shop-Scraper
///
/// Every section is optional in the TOML file; missing sections fall back
/// to the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scraper: ScraperConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    pub rules: ExtractionRules,
}

/// Run limits and request pacing
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScraperConfig {
    /// First listing page to fetch
    pub start_url: String,

    /// Wall-clock limit for the whole run (minutes)
    pub time_limit: Option<u64>,

    /// Maximum number of page fetches
    pub page_limit: Option<u32>,

    /// Fixed delay between page fetches (milliseconds)
    pub delay_ms: u64,

    /// Upper bound of the random extra delay added to `delay_ms`
    pub delay_jitter_ms: u64,

    /// Per-request timeout (seconds)
    pub request_timeout_secs: u64,

    /// Retries for timeouts, connection failures and 5xx responses
    pub retries: u32,

    /// Fixed delay between retries (milliseconds)
    pub retry_backoff_ms: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            start_url: DEFAULT_START_URL.to_string(),
            time_limit: None,
            page_limit: None,
            delay_ms: 500,
            delay_jitter_ms: 500,
            request_timeout_secs: 10,
            retries: 1,
            retry_backoff_ms: 2000,
        }
    }
}

impl ScraperConfig {
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
            .map(|minutes| Duration::from_secs(minutes.saturating_mul(60)))
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// User agent rotation configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Pool of User-Agent strings; one is picked at random per request
    pub agents: Vec<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the CSV file, overwritten on every run
    pub csv_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: DEFAULT_CSV_PATH.to_string(),
        }
    }
}

/// Site-specific extraction rule set: field name to CSS selector
///
/// Adapting the scraper to another shop means replacing these values.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExtractionRules {
    /// Selector for one product entry on a listing page
    pub product: String,

    /// Selector for the product name, relative to the entry
    pub name: String,

    /// Selector for the price, relative to the entry
    pub price: String,

    /// Selector for the product image, relative to the entry
    pub image: String,

    /// Attribute on the image element holding its URL
    pub image_attribute: String,

    /// Selector for the "next page" link, if the site paginates
    pub next_page: Option<String>,

    pub follow: FollowRules,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            product: "li.product".to_string(),
            name: ".woocommerce-loop-product__title".to_string(),
            price: ".price".to_string(),
            image: "img.wp-post-image".to_string(),
            image_attribute: "src".to_string(),
            next_page: Some("a.next.page-numbers".to_string()),
            follow: FollowRules::default(),
        }
    }
}

/// Site-wide link discovery beyond the next-page chain
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FollowRules {
    /// Queue every in-scope link found on a page
    pub enabled: bool,

    /// Domain patterns in scope ("example.com" or "*.example.com")
    pub domains: Vec<String>,

    /// Regex identifying listing pages; only those are extracted when following
    pub listing_pattern: Option<String>,
}

impl Default for FollowRules {
    fn default() -> Self {
        Self {
            enabled: false,
            domains: vec!["*.scrapeme.live".to_string()],
            listing_pattern: Some(r"^https://scrapeme\.live/shop/page/\d+/?$".to_string()),
        }
    }
}
