use crate::test_config;
use shop_scraper::crawler::{FetchError, HttpSession};
use std::time::{Duration, Instant};
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session(base_uri: &str, retries: u32) -> HttpSession {
    let mut config = test_config(base_uri, "unused.csv");
    config.scraper.retries = retries;
    HttpSession::new(&config.scraper, &config.user_agent).expect("Failed to build session")
}

fn page_url(base_uri: &str, page: &str) -> Url {
    Url::parse(&format!("{}{}", base_uri, page)).expect("Failed to parse URL")
}

#[tokio::test]
async fn test_fetch_success_sends_user_agent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/shop/"))
        .and(header("user-agent", "TestBot/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>ok</html>", "text/html"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = session(&mock_server.uri(), 0);
    let page = session
        .fetch_page(&page_url(&mock_server.uri(), "/shop/"), None)
        .await
        .expect("Fetch failed");

    assert_eq!(page.status_code, 200);
    assert_eq!(page.body, "<html>ok</html>");
    assert_eq!(page.final_url.path(), "/shop/");
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/shop/missing/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = session(&mock_server.uri(), 3);
    let result = session
        .fetch_page(&page_url(&mock_server.uri(), "/shop/missing/"), None)
        .await;

    assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
}

#[tokio::test]
async fn test_server_error_retried_then_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/shop/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let session = session(&mock_server.uri(), 2);
    let result = session
        .fetch_page(&page_url(&mock_server.uri(), "/shop/"), None)
        .await;

    assert!(matches!(result, Err(FetchError::Status { status: 503, .. })));
}

#[tokio::test]
async fn test_retry_recovers_after_transient_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/shop/"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/shop/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>back</html>", "text/html"))
        .mount(&mock_server)
        .await;

    let session = session(&mock_server.uri(), 1);
    let page = session
        .fetch_page(&page_url(&mock_server.uri(), "/shop/"), None)
        .await
        .expect("Retry should have succeeded");

    assert_eq!(page.body, "<html>back</html>");
}

#[tokio::test]
async fn test_no_retry_past_deadline() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/shop/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = session(&mock_server.uri(), 5);
    let deadline = Instant::now() + Duration::from_millis(1);
    let result = session
        .fetch_page(&page_url(&mock_server.uri(), "/shop/"), Some(deadline))
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_connection_refused() {
    // Nothing listens on port 1
    let session = session("http://127.0.0.1:1", 0);
    let result = session
        .fetch_page(&page_url("http://127.0.0.1:1", "/shop/"), None)
        .await;

    assert!(matches!(result, Err(FetchError::Connect { .. })));
}
