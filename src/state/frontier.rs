use std::collections::HashSet;
use std::sync::Mutex;

/// Set of URLs already claimed for processing
///
/// Membership means "some task owns this URL", not "this URL is done". Entries
/// are never removed, so the set grows for the lifetime of the crawl.
#[derive(Debug, Default)]
pub struct Frontier {
    claimed: Mutex<HashSet<String>>,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `url` for the caller
    ///
    /// Membership check and insertion happen under one lock, so for any URL
    /// exactly one caller ever sees `true`.
    pub fn try_claim(&self, url: &str) -> bool {
        let mut claimed = self.claimed.lock().unwrap_or_else(|e| e.into_inner());
        claimed.insert(url.to_string())
    }

    /// Advisory membership test
    ///
    /// The answer may be stale by the time the caller acts on it. Only
    /// [`Frontier::try_claim`] decides who does the work.
    pub fn is_claimed(&self, url: &str) -> bool {
        let claimed = self.claimed.lock().unwrap_or_else(|e| e.into_inner());
        claimed.contains(url)
    }

    /// Number of URLs claimed so far
    pub fn len(&self) -> usize {
        self.claimed.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Returns true if nothing has been claimed yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
