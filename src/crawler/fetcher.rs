//! HTTP fetcher implementation
//!
//! This module handles every network request the crawler makes:
//! - Building the HTTP client with timeout and compression support
//! - Choosing a stable client identity per URL
//! - Bounded retry with a fixed backoff on transport failure
//! - Recovering page text from an ordered list of candidate encodings

use crate::config::CrawlerConfig;
use crate::HarvestError;
use encoding_rs::{Encoding, UTF_8};
use reqwest::header::{ACCEPT_LANGUAGE, CONNECTION, CONTENT_TYPE, REFERER, USER_AGENT};
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::time::Duration;
use thiserror::Error;

/// A single failed attempt; every variant counts against the retry budget
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),
}

/// Builds an HTTP client with the configured request timeout
///
/// Compression is negotiated by the client itself, which also sets
/// `Accept-Encoding` to match what it can decode.
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(config.request_timeout_secs);

    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Resilient page retrieval
///
/// Holds no shared crawl state; one instance is shared by all tasks.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    referer: String,
    accept_language: String,
    user_agents: Vec<String>,
    encodings: Vec<&'static Encoding>,
    retry_budget: u32,
    retry_backoff: Duration,
}

impl Fetcher {
    /// Creates a fetcher from the crawler configuration
    ///
    /// # Arguments
    ///
    /// * `config` - Timeouts, retry policy, identities and candidate encodings
    /// * `referer` - Value of the `Referer` header sent with every request
    pub fn new(config: &CrawlerConfig, referer: impl Into<String>) -> Result<Self, HarvestError> {
        let client = build_http_client(config)?;
        let encodings = resolve_encodings(&config.encodings);

        Ok(Self {
            client,
            referer: referer.into(),
            accept_language: config.accept_language.clone(),
            user_agents: config.user_agents.clone(),
            encodings,
            retry_budget: config.retry_budget.max(1),
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    /// Picks the client identity for `url`
    ///
    /// The same URL always maps to the same identity. This only varies the
    /// request fingerprint across URLs, it is not meant to hide anything.
    pub fn user_agent_for(&self, url: &str) -> &str {
        if self.user_agents.is_empty() {
            return "";
        }
        let digest = Sha256::digest(url.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        let index = (u64::from_be_bytes(prefix) % self.user_agents.len() as u64) as usize;
        &self.user_agents[index]
    }

    /// Fetches `url` and returns its decoded text
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Timeout / connection error | Retry after backoff |
    /// | Non-2xx status | Retry after backoff |
    /// | Body read failure | Retry after backoff |
    /// | Budget exhausted | Return `None` |
    ///
    /// Decoding never triggers a retry; see [`decode_body`].
    pub async fn fetch(&self, url: &str) -> Option<String> {
        let mut remaining = self.retry_budget;

        loop {
            tracing::debug!("Requesting {}", url);

            match self.fetch_once(url).await {
                Ok(text) => return Some(text),
                Err(e) => {
                    remaining -= 1;
                    if remaining == 0 {
                        tracing::error!(
                            "Giving up on {} after {} attempts: {}",
                            url,
                            self.retry_budget,
                            e
                        );
                        return None;
                    }

                    tracing::warn!(
                        "Request for {} failed: {}. {} attempt(s) left",
                        url,
                        e,
                        remaining
                    );
                    tokio::time::sleep(self.retry_backoff).await;
                }
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, self.user_agent_for(url))
            .header(REFERER, &self.referer)
            .header(ACCEPT_LANGUAGE, &self.accept_language)
            .header(CONNECTION, "keep-alive")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let declared = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(charset_from_content_type);

        let body = response.bytes().await?;

        Ok(decode_body(&body, &self.encodings, declared.as_deref()))
    }
}

/// Maps configured labels to encodings, dropping unknown ones
///
/// Several labels name the same decoder (`gb2312` is GBK, `iso-8859-1` is
/// windows-1252), so repeats are dropped and the first position wins.
fn resolve_encodings(labels: &[String]) -> Vec<&'static Encoding> {
    let mut resolved: Vec<&'static Encoding> = Vec::with_capacity(labels.len());

    for label in labels {
        let Some(encoding) = Encoding::for_label(label.trim().as_bytes()) else {
            tracing::warn!("Ignoring unknown encoding label '{}'", label);
            continue;
        };
        if resolved.contains(&encoding) {
            tracing::debug!("Encoding label '{}' repeats {}", label, encoding.name());
            continue;
        }
        resolved.push(encoding);
    }

    resolved
}

/// Extracts the `charset` parameter from a Content-Type header value
fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}

/// Decodes a response body using the first candidate that yields clean text
///
/// A candidate is accepted when decoding reports no malformed sequences and the
/// text contains no U+FFFD. If no candidate qualifies, the body is decoded
/// lossily with the declared charset (or UTF-8), so this never fails.
pub fn decode_body(body: &[u8], candidates: &[&'static Encoding], declared: Option<&str>) -> String {
    for encoding in candidates {
        let (text, had_errors) = encoding.decode_without_bom_handling(body);
        if !had_errors && !text.contains(char::REPLACEMENT_CHARACTER) {
            tracing::trace!("Decoded body as {}", encoding.name());
            return text.into_owned();
        }
    }

    let fallback = declared
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);
    tracing::warn!(
        "No candidate encoding decoded cleanly, falling back to {}",
        fallback.name()
    );

    let (text, _, _) = fallback.decode(body);
    text.into_owned()
}
