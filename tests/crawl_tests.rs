//! Integration tests for the harvester
//!
//! These tests use wiremock to stand up a small catalog site and run the
//! full index → list → detail cycle end-to-end against it.

use catalog_harvester::config::{Config, CrawlerConfig, ExtractConfig, OutputConfig, SiteConfig};
use catalog_harvester::{HarvestError, Harvester};
use encoding_rs::GBK;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, storage_root: &Path) -> Config {
    Config {
        site: SiteConfig {
            start_url: format!("{}/index.htm", base_url),
            host: base_url.to_string(),
            referer: None,
        },
        crawler: CrawlerConfig {
            workers: 3,
            crawl_interval_ms: 5, // Very short for testing
            retry_budget: 3,
            retry_backoff_ms: 10,
            request_timeout_secs: 5,
            ..CrawlerConfig::default()
        },
        extract: ExtractConfig::default(),
        output: OutputConfig {
            storage_root: storage_root.to_string_lossy().into_owned(),
            ..OutputConfig::default()
        },
    }
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html")
        .set_body_string(format!("<html><body>{}</body></html>", body))
}

fn gbk_page(body: &str) -> ResponseTemplate {
    let html = format!("<html><body>{}</body></html>", body);
    let (bytes, _, _) = GBK.encode(&html);
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html")
        .set_body_bytes(bytes.into_owned())
}

async fn mount_page(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

async fn forbid_detail_fetches(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/html/[a-z]+/\d+\.html$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_harvest_two_categories() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let tmp = TempDir::new().unwrap();

    mount_page(
        &server,
        "/index.htm",
        gbk_page(
            r#"<div id="menu">
                <a href="/html/a/">电影</a>
                <a href="/html/b/">电视剧</a>
                <a href="/about.html">About</a>
            </div>"#,
        ),
    )
    .await;

    mount_page(
        &server,
        "/html/a/",
        html_page(
            r#"<div class="co_content8">
                <a href="/html/a/1.html">Movie X</a>
                <a href="page2.html">Next</a>
            </div>"#,
        ),
    )
    .await;

    mount_page(
        &server,
        "/html/a/page2.html",
        html_page(
            r#"<div class="co_content8">
                <a href="/html/a/2.html">Movie: Y?</a>
                <a href="/html/a/1.html">Movie X</a>
            </div>"#,
        ),
    )
    .await;

    mount_page(
        &server,
        "/html/b/",
        gbk_page(r#"<div class="co_content8"><a href="/html/b/7.html">第七部</a></div>"#),
    )
    .await;

    forbid_detail_fetches(&server).await;

    let harvester = Harvester::new(create_test_config(&base_url, tmp.path())).unwrap();
    let stats = harvester.run().await.expect("Harvest failed");

    let movies = tmp.path().join("电影");
    let series = tmp.path().join("电视剧");
    assert!(movies.is_dir());
    assert!(series.is_dir());
    assert!(!tmp.path().join("About").exists());

    let record = std::fs::read_to_string(movies.join("Movie X_url.txt")).unwrap();
    assert!(record.contains(&format!("URL: {}/html/a/1.html", base_url)));
    assert!(record.contains("Title: Movie X"));

    let record = std::fs::read_to_string(movies.join("Movie  Y_url.txt")).unwrap();
    assert!(record.contains("Title: Movie: Y?"));
    assert!(record.contains(&format!("URL: {}/html/a/2.html", base_url)));

    assert!(series.join("第七部_url.txt").is_file());

    assert_eq!(stats.records_written, 3);
    assert_eq!(stats.categories_queued, 2);
    assert_eq!(stats.pages_fetched, 4);
    assert_eq!(stats.fetch_failures, 0);
    assert_eq!(stats.tasks_rejected, 0);
    assert!(!harvester.pool().is_accepting());
    assert_eq!(harvester.pool().live(), 0);

    server.verify().await;
}

#[tokio::test]
async fn test_default_interval_keeps_pool_open_for_descendants() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let tmp = TempDir::new().unwrap();

    mount_page(
        &server,
        "/index.htm",
        html_page(r#"<div id="menu"><a href="/html/a/">Movies</a></div>"#),
    )
    .await;
    mount_page(
        &server,
        "/html/a/",
        html_page(
            r#"<div class="co_content8">
                <a href="/html/a/1.html">Movie X</a>
                <a href="page2.html">Next</a>
            </div>"#,
        ),
    )
    .await;
    mount_page(
        &server,
        "/html/a/page2.html",
        html_page(r#"<div class="co_content8"><a href="/html/a/2.html">Movie Y</a></div>"#),
    )
    .await;
    forbid_detail_fetches(&server).await;

    let mut config = create_test_config(&base_url, tmp.path());
    config.crawler.crawl_interval_ms = CrawlerConfig::default().crawl_interval_ms;

    let harvester = Harvester::new(config).unwrap();
    let stats = harvester.run().await.expect("Harvest failed");

    assert_eq!(stats.tasks_rejected, 0);
    assert_eq!(stats.records_written, 2);
    assert_eq!(stats.pages_fetched, 3);
    assert!(tmp.path().join("Movies").join("Movie X_url.txt").is_file());
    assert!(tmp.path().join("Movies").join("Movie Y_url.txt").is_file());
    assert_eq!(harvester.pool().live(), 0);

    server.verify().await;
}

#[tokio::test]
async fn test_interlinked_pagination_fetched_once() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let tmp = TempDir::new().unwrap();

    mount_page(
        &server,
        "/index.htm",
        html_page(r#"<div class="menu"><a href="/html/c/list_1.html">Catalog</a></div>"#),
    )
    .await;

    // Every page links every other page and the same shared detail pages
    let pager: String = (1..=5)
        .map(|i| format!(r#"<a href="list_{}.html">{}</a>"#, i, i))
        .collect();
    for page in 1..=5 {
        let details: String = (1..=3)
            .map(|d| format!(r#"<a href="/html/c/{}.html">Shared {}</a>"#, d, d))
            .collect();
        let own = format!(r#"<a href="/html/c/{}.html">Own {}</a>"#, 100 + page, page);
        mount_page(
            &server,
            &format!("/html/c/list_{}.html", page),
            html_page(&format!(
                r#"<div class="co_content8">{}{}{}</div>"#,
                details, own, pager
            )),
        )
        .await;
    }

    forbid_detail_fetches(&server).await;

    let harvester = Harvester::new(create_test_config(&base_url, tmp.path())).unwrap();
    let stats = harvester.run().await.expect("Harvest failed");

    let catalog = tmp.path().join("Catalog");
    let written = std::fs::read_dir(&catalog).unwrap().count();

    assert_eq!(written, 8);
    assert_eq!(stats.records_written, 8);
    assert_eq!(stats.pages_fetched, 6);
    assert_eq!(harvester.frontier().len(), 5 + 8);

    server.verify().await;
}

#[tokio::test]
async fn test_unreachable_start_page() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/index.htm"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let harvester = Harvester::new(create_test_config(&server.uri(), tmp.path())).unwrap();
    let result = harvester.run().await;

    assert!(matches!(result, Err(HarvestError::StartPage { .. })));
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    assert_eq!(harvester.stats().snapshot().fetch_failures, 1);

    server.verify().await;
}

#[tokio::test]
async fn test_failed_list_page_does_not_stop_siblings() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let tmp = TempDir::new().unwrap();

    mount_page(
        &server,
        "/index.htm",
        html_page(
            r#"<div id="menu">
                <a href="/html/ok/">Good</a>
                <a href="/html/down/">Broken</a>
            </div>"#,
        ),
    )
    .await;

    mount_page(
        &server,
        "/html/ok/",
        html_page(r#"<div class="co_content8"><a href="/html/ok/1.html">Fine</a></div>"#),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/html/down/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let harvester = Harvester::new(create_test_config(&base_url, tmp.path())).unwrap();
    let stats = harvester.run().await.expect("Harvest failed");

    assert!(tmp.path().join("Good").join("Fine_url.txt").is_file());
    assert!(tmp.path().join("Broken").is_dir());
    assert_eq!(stats.records_written, 1);
    assert_eq!(stats.fetch_failures, 1);

    server.verify().await;
}

#[tokio::test]
async fn test_index_snapshot_written() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let tmp = TempDir::new().unwrap();
    let snapshot = tmp.path().join("debug").join("index_debug.html");

    mount_page(&server, "/index.htm", html_page("<p>No categories yet</p>")).await;

    let mut config = create_test_config(&base_url, &tmp.path().join("records"));
    config.output.debug_index_path = Some(snapshot.to_string_lossy().into_owned());

    let harvester = Harvester::new(config).unwrap();
    let stats = harvester.run().await.expect("Harvest failed");

    assert_eq!(stats.records_written, 0);
    assert!(std::fs::read_to_string(&snapshot)
        .unwrap()
        .contains("No categories yet"));

    server.verify().await;
}
