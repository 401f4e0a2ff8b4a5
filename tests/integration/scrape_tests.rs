use crate::{listing_page, test_config, Product};
use shop_scraper::crawler::{scrape, Paginator, ProductRecord, RunLimits};
use shop_scraper::output::StopReason;
use shop_scraper::ScrapeError;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html(body))
        .mount(server)
        .await;
}

/// Serves /shop/page/N/ forever, each page linking to N+1, and records when
/// each request arrived
struct EndlessListing {
    hits: Arc<Mutex<Vec<Instant>>>,
}

impl Respond for EndlessListing {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        self.hits.lock().unwrap().push(Instant::now());

        let current: u32 = request
            .url
            .path()
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .and_then(|n| n.parse().ok())
            .unwrap_or(1);
        let name = format!("Item {}", current);
        let next = format!("/shop/page/{}/", current + 1);

        html(listing_page(
            &[Product::new(&name, "£1.00", "/img.png")],
            Some(&next),
            &[],
        ))
    }
}

async fn endless_shop() -> (MockServer, Arc<Mutex<Vec<Instant>>>) {
    let mock_server = MockServer::start().await;
    let hits = Arc::new(Mutex::new(Vec::new()));

    Mock::given(method("GET"))
        .and(path("/shop/"))
        .respond_with(html(listing_page(
            &[Product::new("Item 0", "£1.00", "/img.png")],
            Some("/shop/page/1/"),
            &[],
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/shop/page/\d+/$"))
        .respond_with(EndlessListing { hits: hits.clone() })
        .mount(&mock_server)
        .await;

    (mock_server, hits)
}

async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .expect("Request recording disabled")
        .len()
}

#[tokio::test]
async fn test_single_page_three_products_to_csv() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/shop/",
        listing_page(
            &[
                Product::new("Bulbasaur", "£63.00", "/uploads/001.png"),
                Product::new("Ivysaur", "£87.00", "/uploads/002.png"),
                Product::new("Venusaur", "£105.00", "/uploads/003.png"),
            ],
            None,
            &[],
        ),
    )
    .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let csv_path = dir.path().join("products.csv");
    let config = test_config(&base_url, csv_path.to_str().unwrap());

    let summary = scrape(&config).await.expect("Scrape failed");

    let content = std::fs::read_to_string(&csv_path).expect("Failed to read CSV");
    let lines: Vec<&str> = content.lines().collect();
    let page_url = format!("{}/shop/", base_url);

    assert_eq!(
        lines,
        vec![
            "name,price,image_url,page_url".to_string(),
            format!("Bulbasaur,£63.00,{}/uploads/001.png,{}", base_url, page_url),
            format!("Ivysaur,£87.00,{}/uploads/002.png,{}", base_url, page_url),
            format!("Venusaur,£105.00,{}/uploads/003.png,{}", base_url, page_url),
        ]
    );

    assert_eq!(summary.pages_fetched, 1);
    assert_eq!(summary.products_written, 3);
    assert_eq!(summary.stop_reason, StopReason::FrontierExhausted);
}

#[tokio::test]
async fn test_follows_next_page_chain() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/shop/",
        listing_page(
            &[Product::new("A", "£1", "/a.png"), Product::new("B", "£2", "/b.png")],
            Some("/shop/page/2/"),
            &[],
        ),
    )
    .await;
    mount_page(
        &mock_server,
        "/shop/page/2/",
        listing_page(
            &[Product::new("C", "£3", "/c.png")],
            Some("/shop/page/3/"),
            &[],
        ),
    )
    .await;
    mount_page(
        &mock_server,
        "/shop/page/3/",
        listing_page(&[Product::new("D", "£4", "/d.png")], None, &[]),
    )
    .await;

    let config = test_config(&mock_server.uri(), "unused.csv");
    let mut paginator = Paginator::new(&config).expect("Failed to create paginator");
    let mut records: Vec<ProductRecord> = Vec::new();

    let summary = paginator.run(&mut records).await.expect("Scrape failed");

    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C", "D"]);
    assert_eq!(summary.pages_fetched, 3);
    assert_eq!(summary.pages_extracted, 3);
    assert_eq!(summary.products_written, records.len() as u64);
    assert_eq!(summary.stop_reason, StopReason::FrontierExhausted);
    assert!(records[2].page_url.ends_with("/shop/page/2/"));
}

#[tokio::test]
async fn test_csv_rows_match_total_records() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/shop/",
        listing_page(
            &[Product::new("A", "£1", "/a.png"), Product::new("B", "£2", "/b.png")],
            Some("/shop/page/2/"),
            &[],
        ),
    )
    .await;
    mount_page(
        &mock_server,
        "/shop/page/2/",
        listing_page(
            &[
                Product::new("C", "£3", "/c.png"),
                Product::new("D", "£4", "/d.png"),
                Product::new("E", "£5", "/e.png"),
            ],
            None,
            &[],
        ),
    )
    .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let csv_path = dir.path().join("products.csv");
    let config = test_config(&mock_server.uri(), csv_path.to_str().unwrap());

    let summary = scrape(&config).await.expect("Scrape failed");

    let content = std::fs::read_to_string(&csv_path).expect("Failed to read CSV");
    assert_eq!(content.lines().count() as u64, 1 + summary.products_written);
    assert_eq!(summary.products_written, 5);
}

#[tokio::test]
async fn test_missing_price_kept_missing_name_skipped() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/shop/",
        listing_page(
            &[
                Product {
                    name: Some("No Price"),
                    price: None,
                    image: Some("/np.png"),
                },
                Product {
                    name: None,
                    price: Some("£9.99"),
                    image: Some("/nn.png"),
                },
                Product {
                    name: Some("No Image"),
                    price: Some("£5.00"),
                    image: None,
                },
            ],
            None,
            &[],
        ),
    )
    .await;

    let config = test_config(&mock_server.uri(), "unused.csv");
    let mut paginator = Paginator::new(&config).expect("Failed to create paginator");
    let mut records: Vec<ProductRecord> = Vec::new();

    let summary = paginator.run(&mut records).await.expect("Scrape failed");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "No Price");
    assert_eq!(records[0].price, None);
    assert_eq!(records[1].name, "No Image");
    assert_eq!(records[1].image_url, None);
    assert_eq!(summary.entries_skipped, 1);
}

#[tokio::test]
async fn test_page_limit_caps_fetches() {
    let (mock_server, _hits) = endless_shop().await;

    let mut config = test_config(&mock_server.uri(), "unused.csv");
    config.scraper.page_limit = Some(4);
    let mut paginator = Paginator::new(&config).expect("Failed to create paginator");
    let mut records: Vec<ProductRecord> = Vec::new();

    let summary = paginator.run(&mut records).await.expect("Scrape failed");

    assert_eq!(request_count(&mock_server).await, 4);
    assert_eq!(summary.pages_fetched, 4);
    assert_eq!(summary.stop_reason, StopReason::PageLimit);
    assert_eq!(records.len(), 4);
}

#[tokio::test]
async fn test_zero_time_limit_fetches_nothing() {
    let (mock_server, _hits) = endless_shop().await;

    let config = test_config(&mock_server.uri(), "unused.csv");
    let mut paginator = Paginator::new(&config)
        .expect("Failed to create paginator")
        .with_limits(RunLimits {
            page_limit: None,
            time_limit: Some(Duration::ZERO),
            delay: Duration::ZERO,
            delay_jitter: Duration::ZERO,
        });
    let mut records: Vec<ProductRecord> = Vec::new();

    let summary = paginator.run(&mut records).await.expect("Scrape failed");

    assert_eq!(request_count(&mock_server).await, 0);
    assert_eq!(summary.pages_fetched, 0);
    assert_eq!(summary.stop_reason, StopReason::TimeLimit);
}

#[tokio::test]
async fn test_no_fetch_starts_after_time_limit() {
    let (mock_server, hits) = endless_shop().await;
    let time_limit = Duration::from_millis(300);

    let config = test_config(&mock_server.uri(), "unused.csv");
    let mut paginator = Paginator::new(&config)
        .expect("Failed to create paginator")
        .with_limits(RunLimits {
            page_limit: None,
            time_limit: Some(time_limit),
            delay: Duration::from_millis(100),
            delay_jitter: Duration::ZERO,
        });
    let mut records: Vec<ProductRecord> = Vec::new();

    let start = Instant::now();
    let summary = paginator.run(&mut records).await.expect("Scrape failed");

    assert_eq!(summary.stop_reason, StopReason::TimeLimit);
    assert!(summary.pages_fetched >= 1);
    assert!(summary.pages_fetched <= 4);

    // Arrival can trail the start of a request by transit time only
    let cutoff = start + time_limit + Duration::from_millis(100);
    for hit in hits.lock().unwrap().iter() {
        assert!(*hit < cutoff, "Request arrived after the time limit");
    }
}

#[tokio::test]
async fn test_failed_page_is_skipped() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/shop/",
        listing_page(
            &[Product::new("A", "£1", "/a.png")],
            None,
            &["/shop/page/2/", "/shop/page/3/", "/about/"],
        ),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/shop/page/2/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_page(
        &mock_server,
        "/shop/page/3/",
        listing_page(&[Product::new("C", "£3", "/c.png")], None, &[]),
    )
    .await;

    mount_page(
        &mock_server,
        "/about/",
        listing_page(&[Product::new("Not a listing", "£0", "/x.png")], None, &[]),
    )
    .await;

    let mut config = test_config(&base_url, "unused.csv");
    config.rules.follow.enabled = true;
    config.rules.follow.domains = vec!["127.0.0.1".to_string()];
    config.rules.follow.listing_pattern =
        Some(format!(r"^{}/shop/page/\d+/$", regex::escape(&base_url)));

    let mut paginator = Paginator::new(&config).expect("Failed to create paginator");
    let mut records: Vec<ProductRecord> = Vec::new();

    let summary = paginator.run(&mut records).await.expect("Scrape failed");

    // /shop/ and /about/ do not match the listing pattern
    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["C"]);
    assert_eq!(summary.pages_fetched, 4);
    assert_eq!(summary.pages_failed, 1);
    assert_eq!(summary.pages_extracted, 1);
    assert_eq!(summary.pages_processed(), 3);
}

#[tokio::test]
async fn test_follow_without_pattern_extracts_only_pagination() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/shop/",
        listing_page(
            &[Product::new("A", "£1", "/a.png")],
            Some("/shop/page/2/"),
            &["/about/"],
        ),
    )
    .await;
    mount_page(
        &mock_server,
        "/shop/page/2/",
        listing_page(&[Product::new("B", "£2", "/b.png")], None, &[]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/about/"))
        .respond_with(html(listing_page(
            &[Product::new("About blurb", "£0", "/x.png")],
            None,
            &[],
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = test_config(&mock_server.uri(), "unused.csv");
    config.rules.follow.enabled = true;
    config.rules.follow.domains = vec!["127.0.0.1".to_string()];
    config.rules.follow.listing_pattern = None;

    let mut paginator = Paginator::new(&config).expect("Failed to create paginator");
    let mut records: Vec<ProductRecord> = Vec::new();

    let summary = paginator.run(&mut records).await.expect("Scrape failed");

    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
    assert_eq!(summary.pages_fetched, 3);
    assert_eq!(summary.pages_extracted, 2);
}

#[tokio::test]
async fn test_unwritable_output_aborts_before_fetching() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/shop/",
        listing_page(&[Product::new("A", "£1", "/a.png")], None, &[]),
    )
    .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let csv_path = dir.path().join("missing-dir").join("products.csv");
    let config = test_config(&mock_server.uri(), csv_path.to_str().unwrap());

    let result = scrape(&config).await;

    assert!(matches!(result, Err(ScrapeError::Io(_))));
    assert_eq!(request_count(&mock_server).await, 0);
}

#[tokio::test]
async fn test_output_overwritten_between_runs() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/shop/",
        listing_page(&[Product::new("Fresh", "£1", "/a.png")], None, &[]),
    )
    .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let csv_path = dir.path().join("products.csv");
    std::fs::write(&csv_path, "name,price,image_url,page_url\nStale,,,\n").unwrap();

    let config = test_config(&mock_server.uri(), csv_path.to_str().unwrap());
    scrape(&config).await.expect("Scrape failed");

    let content = std::fs::read_to_string(&csv_path).unwrap();
    assert!(!content.contains("Stale"));
    assert!(content.contains("Fresh"));
    assert_eq!(content.lines().count(), 2);
}
