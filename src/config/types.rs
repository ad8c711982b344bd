use serde::Deserialize;

/// Main configuration structure for Catalog-Harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// The index page the crawl starts from
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Scheme and authority prepended to host-relative links (no trailing slash)
    pub host: String,

    /// Referer header sent with every request; defaults to `host`
    #[serde(default)]
    pub referer: Option<String>,
}

impl SiteConfig {
    /// Returns the referer to send, falling back to the host prefix
    pub fn referer(&self) -> &str {
        self.referer.as_deref().unwrap_or(&self.host)
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of crawl tasks executing at once
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Pause before each list/detail task body (milliseconds)
    #[serde(rename = "crawl-interval-ms", default = "default_crawl_interval_ms")]
    pub crawl_interval_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Total attempts per fetch before giving up
    #[serde(rename = "retry-budget", default = "default_retry_budget")]
    pub retry_budget: u32,

    /// Fixed pause between attempts (milliseconds)
    #[serde(rename = "retry-backoff-ms", default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    #[serde(rename = "accept-language", default = "default_accept_language")]
    pub accept_language: String,

    /// Client identities; one is picked per URL by hashing
    #[serde(rename = "user-agents", default = "default_user_agents")]
    pub user_agents: Vec<String>,

    /// Candidate text encodings, tried in order
    #[serde(default = "default_encodings")]
    pub encodings: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            crawl_interval_ms: default_crawl_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            retry_budget: default_retry_budget(),
            retry_backoff_ms: default_retry_backoff_ms(),
            accept_language: default_accept_language(),
            user_agents: default_user_agents(),
            encodings: default_encodings(),
        }
    }
}

/// Link extraction configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractConfig {
    /// CSS selectors tried in order on the index page
    #[serde(rename = "index-selectors", default = "default_index_selectors")]
    pub index_selectors: Vec<String>,

    /// CSS selector for content anchors on list pages
    #[serde(rename = "list-selector", default = "default_list_selector")]
    pub list_selector: String,

    /// Regex an index href must match to count as a category
    #[serde(rename = "category-pattern", default = "default_category_pattern")]
    pub category_pattern: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            index_selectors: default_index_selectors(),
            list_selector: default_list_selector(),
            category_pattern: default_category_pattern(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory that receives one subdirectory per category
    #[serde(rename = "storage-root", default = "default_storage_root")]
    pub storage_root: String,

    /// Directory name under the working directory used when the root is unusable
    #[serde(rename = "fallback-dir", default = "default_fallback_dir")]
    pub fallback_dir: String,

    /// Where to save the raw index page, if anywhere
    #[serde(rename = "debug-index-path", default)]
    pub debug_index_path: Option<String>,

    /// File that receives a copy of the log alongside the console, if any
    #[serde(rename = "log-file", default)]
    pub log_file: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            storage_root: default_storage_root(),
            fallback_dir: default_fallback_dir(),
            debug_index_path: None,
            log_file: None,
        }
    }
}

fn default_workers() -> usize {
    5
}

fn default_crawl_interval_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_retry_budget() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    2000
}

fn default_accept_language() -> String {
    "zh-CN,zh;q=0.9".to_string()
}

fn default_user_agents() -> Vec<String> {
    [
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_encodings() -> Vec<String> {
    ["gbk", "utf-8", "gb2312", "iso-8859-1"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_index_selectors() -> Vec<String> {
    [
        "div#menu a",
        "div.menu a",
        "ul.menu a",
        "div[id*=\"menu\"] a",
        "div[class*=\"menu\"] a",
        "a[href*=\"/html/\"]",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_list_selector() -> String {
    "div.co_content8 a".to_string()
}

fn default_category_pattern() -> String {
    r"^/html/[A-Za-z0-9_/]+(?:index\.html)?".to_string()
}

fn default_storage_root() -> String {
    "./records".to_string()
}

fn default_fallback_dir() -> String {
    "records".to_string()
}
