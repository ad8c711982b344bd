//! Catalog-Harvester: a recursive catalog crawler
//!
//! This crate walks a hierarchical website (index page → category listings →
//! paginated sub-listings → detail pages) and writes one small record file per
//! discovered detail page, deduplicating URLs and bounding concurrency.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Catalog-Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to fetch start page {url}")]
    StartPage { url: String },

    #[error("Worker pool is no longer accepting tasks")]
    PoolClosed,

    #[error("Invalid category pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector in config: {0}")]
    InvalidSelector(String),

    #[error("Invalid category pattern in config: {0}")]
    InvalidPattern(String),
}

/// Result type alias for Catalog-Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{harvest, CrawlTask, Harvester, PageRole, WorkerPool};
pub use output::{HarvestStats, Sink};
pub use state::Frontier;
