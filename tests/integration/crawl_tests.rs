//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small storefront and run the full
//! crawl cycle end-to-end over the HTTP session backend.

use catalog_ripple::config::{validate, Config};
use catalog_ripple::crawler::{discover_leaves, run_crawl};
use catalog_ripple::{CatalogError, OutputRow};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, csv_path: &Path) -> Config {
    let mut config = Config::default();
    config.crawler.seed_url = format!("{}/", base_url);
    config.crawler.workers = 2;
    config.crawler.page_timeout_secs = 5;
    config.crawler.retry_delay_ms = 10;
    config.crawler.request_delay_ms = 0;
    config.output.csv_path = csv_path.display().to_string();
    config
}

async fn serve(server: &MockServer, route: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_string(body.to_string())
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn read_rows(path: &Path, delimiter: u8) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_path(path)
        .expect("Failed to open output");
    reader
        .records()
        .map(|r| {
            r.expect("Malformed record")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect()
}

/// Mounts a storefront with two product types, one of which is broken
async fn mount_storefront(server: &MockServer) {
    serve(
        server,
        "/",
        200,
        r#"<html><body><h1>Beauty Store</h1>
        <ul>
          <li class="category-menu">
            <a href="/makeup">Makeup</a>
            <div class="subcategory-heading">Lips</div>
            <ul>
              <li><a href="/lipstick">Lipstick</a></li>
              <li><a href="/lip-gloss">Lip Gloss</a></li>
            </ul>
            <div class="subcategory-heading">Eyes</div>
            <ul>
              <li><a href="javascript:void(0)">Coming soon</a></li>
            </ul>
          </li>
          <li class="category-menu">
            <a href="/offers">Offers</a>
          </li>
        </ul>
        </body></html>"#,
    )
    .await;

    serve(
        server,
        "/lipstick",
        200,
        r#"<html><body><div class="product-listing">
          <div class="product-card">
            <a href="/p/1"><span class="product-name">Lakme 9to5 Primer + Matte</span></a>
            <span class="product-price">₹ 450</span>
            <span class="product-discount">10% Off</span>
          </div>
          <div class="product-card">
            <a href="/p/2"><span class="product-name">Sugar Smudge Me Not</span></a>
            <span class="product-price">₹ 499</span>
          </div>
        </div></body></html>"#,
    )
    .await;

    serve(server, "/lip-gloss", 404, "<html><body>Not found</body></html>").await;

    serve(
        server,
        "/p/1",
        200,
        r#"<html><body><h1>Lakme 9to5</h1>
          <span class="product-rating">4.2</span>
          <span class="product-rating-count">1,204 ratings</span>
          <div class="product-description">Matte, long-wearing; "transfer proof".</div>
        </body></html>"#,
    )
    .await;

    serve(server, "/p/2", 404, "gone").await;
}

#[tokio::test]
async fn test_full_crawl_writes_rows() {
    let mock_server = MockServer::start().await;
    mount_storefront(&mock_server).await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let csv_path = dir.path().join("catalog.csv");
    let config = create_test_config(&mock_server.uri(), &csv_path);
    validate(&config).expect("Test config should be valid");

    let report = run_crawl(config).await.expect("Crawl should succeed");

    assert_eq!(report.leaves_total, 2);
    assert_eq!(report.leaves_succeeded, 1);
    assert_eq!(report.leaves_failed, 1);
    assert_eq!(report.rows_written, 2);
    assert_eq!(report.details_fetched, 1);
    assert_eq!(report.detail_failures, 1);
    assert_eq!(report.sessions_created, 1);

    let rows = read_rows(&csv_path, b',');
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], OutputRow::HEADER.to_vec());
    assert!(rows.iter().all(|r| r.len() == 10));

    let lakme = rows
        .iter()
        .find(|r| r[3] == "Lakme 9to5 Primer + Matte")
        .expect("Lakme row missing");
    assert_eq!(
        lakme[..7].to_vec(),
        vec!["Makeup", "Lips", "Lipstick", "Lakme 9to5 Primer + Matte", "Lakme", "₹ 450", "10% Off"]
    );
    assert_eq!(lakme[7], "4.2");
    assert_eq!(lakme[8], "1,204 ratings");
    assert_eq!(lakme[9], r#"Matte, long-wearing; "transfer proof"."#);

    let sugar = rows
        .iter()
        .find(|r| r[3] == "Sugar Smudge Me Not")
        .expect("Sugar row missing");
    assert_eq!(sugar[4], "Sugar");
    assert_eq!(sugar[6], "");
    assert_eq!(&sugar[7..], &["", "", ""]);
}

#[tokio::test]
async fn test_crawl_with_semicolon_delimiter_and_no_details() {
    let mock_server = MockServer::start().await;
    mount_storefront(&mock_server).await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let csv_path = dir.path().join("catalog.csv");
    let mut config = create_test_config(&mock_server.uri(), &csv_path);
    config.output.delimiter = ";".to_string();
    config.crawler.fetch_details = false;

    let report = run_crawl(config).await.expect("Crawl should succeed");
    assert_eq!(report.rows_written, 2);
    assert_eq!(report.details_fetched, 0);

    let rows = read_rows(&csv_path, b';');
    assert_eq!(rows.len(), 3);
    assert!(rows[1..].iter().all(|r| r[7].is_empty() && r[9].is_empty()));

    let requests = mock_server
        .received_requests()
        .await
        .expect("Request recording is enabled");
    assert!(requests.iter().all(|r| !r.url.path().starts_with("/p/")));
}

#[tokio::test]
async fn test_dry_run_discovery() {
    let mock_server = MockServer::start().await;
    mount_storefront(&mock_server).await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let csv_path = dir.path().join("catalog.csv");
    let config = create_test_config(&mock_server.uri(), &csv_path);

    let leaves = discover_leaves(&config).await.expect("Discovery should succeed");
    let names: Vec<String> = leaves.iter().map(|l| l.to_string()).collect();
    assert_eq!(
        names,
        vec!["Makeup > Lips > Lipstick", "Makeup > Lips > Lip Gloss"]
    );
    assert!(!csv_path.exists());
}

#[tokio::test]
async fn test_seed_failure_aborts_run() {
    let mock_server = MockServer::start().await;
    serve(&mock_server, "/", 403, "Access denied").await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let csv_path = dir.path().join("catalog.csv");
    let config = create_test_config(&mock_server.uri(), &csv_path);

    let result = run_crawl(config).await;
    assert!(matches!(result, Err(CatalogError::Seed { .. })));

    let rows = read_rows(&csv_path, b',');
    assert_eq!(rows, vec![OutputRow::HEADER.to_vec()]);
}

#[tokio::test]
async fn test_seed_without_marker_aborts_run() {
    let mock_server = MockServer::start().await;
    serve(&mock_server, "/", 200, "<html><body><p>Please wait</p></body></html>").await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let csv_path = dir.path().join("catalog.csv");
    let config = create_test_config(&mock_server.uri(), &csv_path);

    let result = run_crawl(config).await;
    assert!(matches!(result, Err(CatalogError::Seed { .. })));
}
