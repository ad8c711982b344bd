//! Harvest coordinator - task dispatch and run lifecycle
//!
//! The coordinator owns everything tasks share (frontier, fetcher, sink,
//! statistics, pool) in one context passed to every task by `Arc`. A run goes
//! through three phases:
//!
//! 1. The index task fetches the start page and queues one list task per category
//! 2. List tasks walk pagination and queue detail tasks, all concurrently
//! 3. Once the index task has returned, the pool gate closes and the run drains

use crate::config::Config;
use crate::crawler::extractor::{classify_list_href, extract_links, Link, ListLinkKind};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::pool::WorkerPool;
use crate::crawler::task::{CrawlTask, PageRole};
use crate::output::{log_summary, HarvestStats, Sink, StatsSnapshot};
use crate::state::Frontier;
use crate::url::{absolutize, path_label, resolve_in_directory, sanitize_name};
use crate::HarvestError;
use futures::FutureExt;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

/// Directory name used when a category has neither text nor a usable path
const UNKNOWN_CATEGORY: &str = "unknown-category";

/// Shared context for one harvest run
pub struct Harvester {
    start_url: String,
    host: String,
    index_selectors: Vec<String>,
    list_selector: String,
    category_pattern: Regex,
    crawl_interval: Duration,
    debug_index_path: Option<PathBuf>,
    frontier: Frontier,
    fetcher: Fetcher,
    sink: Sink,
    stats: HarvestStats,
    pool: WorkerPool,
}

impl Harvester {
    /// Creates a harvester from a validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<Harvester>)` - Ready to [`run`](Harvester::run)
    /// * `Err(HarvestError)` - The HTTP client or category pattern could not be built
    pub fn new(config: Config) -> Result<Arc<Self>, HarvestError> {
        let sink = Sink::new(&config.output.storage_root, &config.output.fallback_dir);
        Self::with_sink(config, sink)
    }

    /// Creates a harvester that writes through the given sink
    pub fn with_sink(config: Config, sink: Sink) -> Result<Arc<Self>, HarvestError> {
        let fetcher = Fetcher::new(&config.crawler, config.site.referer())?;
        let category_pattern = Regex::new(&config.extract.category_pattern)?;

        Ok(Arc::new(Self {
            start_url: config.site.start_url,
            host: config.site.host,
            index_selectors: config.extract.index_selectors,
            list_selector: config.extract.list_selector,
            category_pattern,
            crawl_interval: Duration::from_millis(config.crawler.crawl_interval_ms),
            debug_index_path: config.output.debug_index_path.map(PathBuf::from),
            frontier: Frontier::new(),
            fetcher,
            sink,
            stats: HarvestStats::new(),
            pool: WorkerPool::new(config.crawler.workers),
        }))
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn stats(&self) -> &HarvestStats {
        &self.stats
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn sink(&self) -> &Sink {
        &self.sink
    }

    /// Runs a complete harvest
    ///
    /// Submits the index task and waits for it to return. List and detail
    /// tasks keep submitting descendants until the pool has no live task left;
    /// only then is the gate closed and the pool drained.
    ///
    /// # Returns
    ///
    /// * `Ok(StatsSnapshot)` - Final counters after the pool drained
    /// * `Err(HarvestError::StartPage)` - The start page could not be fetched
    pub async fn run(self: &Arc<Self>) -> Result<StatsSnapshot, HarvestError> {
        let started = Instant::now();
        tracing::info!("Starting harvest at {}", self.start_url);

        let (done_tx, done_rx) = oneshot::channel();
        let index = CrawlTask::index(self.start_url.clone(), self.sink.root());
        if !self.dispatch(index, Some(done_tx)) {
            return Err(HarvestError::PoolClosed);
        }

        let outcome = match done_rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(HarvestError::StartPage {
                url: self.start_url.clone(),
            }),
        };

        match &outcome {
            Ok(()) => {
                tracing::info!("All categories queued, waiting for listings to settle");
                // Only running tasks submit, so an idle pool can never grow again
                self.pool.wait_idle().await;
            }
            Err(e) => tracing::error!("Index task failed, stopping: {}", e),
        }

        self.pool.close_and_drain().await;

        let snapshot = self.stats.snapshot();
        log_summary(&snapshot, self.frontier.len(), started.elapsed());
        outcome.map(|()| snapshot)
    }

    /// Submits a task to the pool
    ///
    /// Returns immediately. Returns `false` if the pool is draining and the
    /// task was dropped.
    pub fn submit(self: &Arc<Self>, task: CrawlTask) -> bool {
        self.dispatch(task, None)
    }

    fn dispatch(
        self: &Arc<Self>,
        task: CrawlTask,
        done: Option<oneshot::Sender<Result<(), HarvestError>>>,
    ) -> bool {
        let label = task.to_string();
        let this = Arc::clone(self);

        let accepted = self.pool.submit(
            &label,
            async move {
                let outcome = this.run_task(task).await;
                if let Err(e) = &outcome {
                    tracing::error!("Task failed: {}", e);
                }
                if let Some(done) = done {
                    let _ = done.send(outcome);
                }
            }
            .boxed(),
        );

        if !accepted {
            self.stats.task_rejected();
        }
        accepted
    }

    async fn run_task(self: Arc<Self>, task: CrawlTask) -> Result<(), HarvestError> {
        match task.role {
            PageRole::Index => self.crawl_index(&task.url).await.map(|_| ()),
            PageRole::List => {
                self.crawl_list(&task.url, &task.dir).await;
                Ok(())
            }
            PageRole::Detail => {
                let name = task.name.as_deref().unwrap_or_default();
                self.crawl_detail(&task.url, &task.dir, name).await;
                Ok(())
            }
        }
    }

    /// Processes the index page and queues one list task per category
    ///
    /// Returns the number of list tasks accepted by the pool.
    async fn crawl_index(self: &Arc<Self>, url: &str) -> Result<usize, HarvestError> {
        tracing::info!("Fetching index page {}", url);

        let Some(page) = self.fetcher.fetch(url).await else {
            self.stats.fetch_failed();
            return Err(HarvestError::StartPage {
                url: url.to_string(),
            });
        };
        self.stats.page_fetched();

        if let Some(path) = &self.debug_index_path {
            self.sink.write_snapshot(path, &page).await;
        }

        let links = extract_links(
            &page,
            PageRole::Index,
            &self.index_selectors,
            &self.list_selector,
        );

        let mut queued = 0;
        for link in links {
            if !self.category_pattern.is_match(&link.href) {
                tracing::trace!("Not a category link: {}", link.href);
                continue;
            }

            let list_url = absolutize(&self.host, &link.href);
            if self.frontier.is_claimed(&list_url) {
                continue;
            }

            let category = category_name(&self.host, &link);
            let Some(dir) = self.sink.ensure_category(&category).await else {
                tracing::error!("Skipping category {}: no usable directory", category);
                continue;
            };
            tracing::info!("Queueing category {} ({})", category, list_url);
            if self.submit(CrawlTask::list(list_url, dir)) {
                self.stats.category_queued();
                queued += 1;
            }
        }

        tracing::info!("Queued {} category listing(s)", queued);
        Ok(queued)
    }

    /// Processes one list page, queueing detail pages and further pagination
    async fn crawl_list(self: &Arc<Self>, url: &str, dir: &Path) {
        tokio::time::sleep(self.crawl_interval).await;

        if !self.frontier.try_claim(url) {
            self.stats.duplicate_skipped();
            tracing::debug!("List page already claimed: {}", url);
            return;
        }

        let Some(page) = self.fetcher.fetch(url).await else {
            self.stats.fetch_failed();
            return;
        };
        self.stats.page_fetched();
        tracing::info!("Parsing list page {}", url);

        let links = extract_links(
            &page,
            PageRole::List,
            &self.index_selectors,
            &self.list_selector,
        );

        for link in links {
            match classify_list_href(&link.href) {
                ListLinkKind::Detail => {
                    let detail_url = absolutize(&self.host, &link.href);
                    let Some(title) = link.text else {
                        tracing::debug!("Skipping untitled detail link {}", detail_url);
                        continue;
                    };
                    if self.frontier.is_claimed(&detail_url) {
                        continue;
                    }
                    self.submit(CrawlTask::detail(detail_url, dir, title));
                }
                ListLinkKind::Pagination => {
                    let Some(page_url) = resolve_in_directory(url, &link.href) else {
                        continue;
                    };
                    if self.frontier.is_claimed(&page_url) {
                        continue;
                    }
                    self.submit(CrawlTask::list(page_url, dir));
                }
                ListLinkKind::Ignored => {
                    tracing::trace!("Ignoring link {} on {}", link.href, url);
                }
            }
        }
    }

    /// Records one detail page; the page itself is never fetched
    async fn crawl_detail(&self, url: &str, dir: &Path, name: &str) {
        tokio::time::sleep(self.crawl_interval).await;

        if !self.frontier.try_claim(url) {
            self.stats.duplicate_skipped();
            tracing::debug!("Detail page already claimed: {}", url);
            return;
        }

        if self.sink.write_record(dir, name, url).await {
            self.stats.record_written();
        } else {
            self.stats.record_failed();
        }
    }
}

/// Picks the directory name for a category link
///
/// Prefers the link text, then a label derived from the href path, then a
/// fixed placeholder.
fn category_name(host: &str, link: &Link) -> String {
    link.text
        .as_deref()
        .and_then(sanitize_name)
        .or_else(|| path_label(host, &link.href).and_then(|label| sanitize_name(&label)))
        .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string())
}

/// Runs a complete harvest for the given configuration
///
/// # Example
///
/// ```no_run
/// use catalog_harvester::config::load_config;
/// use catalog_harvester::crawler::run_harvest;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let stats = run_harvest(config).await?;
/// println!("{} records written", stats.records_written);
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(config: Config) -> Result<StatsSnapshot, HarvestError> {
    let harvester = Harvester::new(config)?;
    harvester.run().await
}
