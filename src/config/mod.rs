//! Configuration module for Catalog-Harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Only `[site]` is mandatory; every other table falls back to defaults that
//! match a typical GBK-encoded catalog site.
//!
//! # Example
//!
//! ```no_run
//! use catalog_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Workers: {}", config.crawler.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, ExtractConfig, OutputConfig, SiteConfig};

// Re-export parser functions
pub use parser::{config_digest, load_config, load_config_with_hash, parse_config};
