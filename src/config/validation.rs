use crate::config::types::{Config, CrawlerConfig, ExtractConfig, OutputConfig, SiteConfig};
use crate::ConfigError;
use regex::Regex;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_crawler_config(&config.crawler)?;
    validate_extract_config(&config.extract)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the target site: both URLs must be http(s), host without trailing slash
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_http_url("start-url", &config.start_url)?;
    let host = validate_http_url("host", &config.host)?;

    if config.host.ends_with('/') {
        return Err(ConfigError::Validation(format!(
            "host must not end with '/', got '{}'",
            config.host
        )));
    }

    if host.path() != "/" || host.query().is_some() {
        return Err(ConfigError::Validation(format!(
            "host must be a bare scheme and authority, got '{}'",
            config.host
        )));
    }

    if let Some(referer) = &config.referer {
        validate_http_url("referer", referer)?;
    }

    Ok(())
}

fn validate_http_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(url)
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 100 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 100, got {}",
            config.workers
        )));
    }

    if config.retry_budget < 1 {
        return Err(ConfigError::Validation(
            "retry-budget must be >= 1".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.user_agents.is_empty() || config.user_agents.iter().any(|ua| ua.trim().is_empty())
    {
        return Err(ConfigError::Validation(
            "user-agents must contain at least one non-empty entry".to_string(),
        ));
    }

    if config.encodings.is_empty() {
        return Err(ConfigError::Validation(
            "encodings cannot be empty".to_string(),
        ));
    }

    for label in &config.encodings {
        if encoding_rs::Encoding::for_label(label.as_bytes()).is_none() {
            return Err(ConfigError::Validation(format!(
                "Unknown encoding label '{}'",
                label
            )));
        }
    }

    Ok(())
}

/// Validates that every selector parses and the category pattern compiles
fn validate_extract_config(config: &ExtractConfig) -> Result<(), ConfigError> {
    if config.index_selectors.is_empty() {
        return Err(ConfigError::Validation(
            "index-selectors cannot be empty".to_string(),
        ));
    }

    for selector in config
        .index_selectors
        .iter()
        .chain(std::iter::once(&config.list_selector))
    {
        Selector::parse(selector)
            .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e)))?;
    }

    Regex::new(&config.category_pattern).map_err(|e| {
        ConfigError::InvalidPattern(format!("'{}': {}", config.category_pattern, e))
    })?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.storage_root.trim().is_empty() {
        return Err(ConfigError::Validation(
            "storage-root cannot be empty".to_string(),
        ));
    }

    if config.fallback_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "fallback-dir cannot be empty".to_string(),
        ));
    }

    if let Some(log_file) = &config.log_file {
        if std::path::Path::new(log_file.trim()).file_name().is_none() {
            return Err(ConfigError::Validation(format!(
                "log-file '{}' does not name a file",
                log_file
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteConfig {
        SiteConfig {
            start_url: "https://example.com/index.htm".to_string(),
            host: "https://example.com".to_string(),
            referer: None,
        }
    }

    fn config() -> Config {
        Config {
            site: site(),
            crawler: CrawlerConfig::default(),
            extract: ExtractConfig::default(),
            output: OutputConfig::default(),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&config()).is_ok());
    }

    #[test]
    fn test_validate_site() {
        let mut bad = site();
        bad.host = "https://example.com/".to_string();
        assert!(matches!(
            validate_site_config(&bad),
            Err(ConfigError::Validation(_))
        ));

        let mut bad = site();
        bad.host = "https://example.com/sub".to_string();
        assert!(validate_site_config(&bad).is_err());

        let mut bad = site();
        bad.start_url = "ftp://example.com/".to_string();
        assert!(matches!(
            validate_site_config(&bad),
            Err(ConfigError::InvalidUrl(_))
        ));

        let mut bad = site();
        bad.start_url = "not a url".to_string();
        assert!(matches!(
            validate_site_config(&bad),
            Err(ConfigError::InvalidUrl(_))
        ));

        let mut local = site();
        local.host = "http://127.0.0.1:8080".to_string();
        assert!(validate_site_config(&local).is_ok());
    }

    #[test]
    fn test_validate_crawler_bounds() {
        let mut crawler = CrawlerConfig::default();
        crawler.workers = 0;
        assert!(validate_crawler_config(&crawler).is_err());

        crawler.workers = 101;
        assert!(validate_crawler_config(&crawler).is_err());

        crawler.workers = 1;
        crawler.retry_budget = 0;
        assert!(validate_crawler_config(&crawler).is_err());

        crawler.retry_budget = 1;
        crawler.user_agents = vec![" ".to_string()];
        assert!(validate_crawler_config(&crawler).is_err());
    }

    #[test]
    fn test_validate_encodings() {
        let mut crawler = CrawlerConfig::default();
        crawler.encodings = vec!["utf-8".to_string(), "no-such-charset".to_string()];
        assert!(validate_crawler_config(&crawler).is_err());

        crawler.encodings.clear();
        assert!(validate_crawler_config(&crawler).is_err());

        crawler.encodings = vec!["GB2312".to_string(), "latin1".to_string()];
        assert!(validate_crawler_config(&crawler).is_ok());
    }

    #[test]
    fn test_validate_extract() {
        let mut extract = ExtractConfig::default();
        extract.list_selector = "div[".to_string();
        assert!(matches!(
            validate_extract_config(&extract),
            Err(ConfigError::InvalidSelector(_))
        ));

        let mut extract = ExtractConfig::default();
        extract.category_pattern = "(unclosed".to_string();
        assert!(matches!(
            validate_extract_config(&extract),
            Err(ConfigError::InvalidPattern(_))
        ));

        let mut extract = ExtractConfig::default();
        extract.index_selectors.clear();
        assert!(validate_extract_config(&extract).is_err());
    }

    #[test]
    fn test_validate_output() {
        let mut output = OutputConfig::default();
        output.storage_root = "  ".to_string();
        assert!(validate_output_config(&output).is_err());
    }

    #[test]
    fn test_validate_log_file() {
        let mut output = OutputConfig::default();
        output.log_file = Some("logs/crawler.log".to_string());
        assert!(validate_output_config(&output).is_ok());

        output.log_file = Some("".to_string());
        assert!(validate_output_config(&output).is_err());

        output.log_file = Some("logs/..".to_string());
        assert!(validate_output_config(&output).is_err());
    }
}
