use review_harvester::config::FetchConfig;
use review_harvester::crawler::{
    build_http_client, DelayWindow, FetchFailure, FetchOutcome, PageFetcher, RateLimiter,
};
use std::time::{Duration, Instant};
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fetch settings with short cooldowns and timeouts
fn fast_fetch_config() -> FetchConfig {
    FetchConfig {
        max_attempts: 3,
        request_timeout: 5.0,
        block_cooldown: 0.3,
        timeout_cooldown: 0.3,
        ..FetchConfig::default()
    }
}

fn fetcher_with(config: &FetchConfig, window: DelayWindow) -> PageFetcher {
    let client = build_http_client(config).expect("Failed to build client");
    PageFetcher::new(client, RateLimiter::new(window), config)
}

fn fetcher(config: &FetchConfig) -> PageFetcher {
    fetcher_with(config, DelayWindow::from_secs(0.0, 0.0))
}

async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .expect("Request recording is enabled")
        .len()
}

#[tokio::test]
async fn test_fetch_returns_page_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reviews/bank/"))
        .and(header_exists("user-agent"))
        .and(header_exists("accept-language"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body>reviews</body></html>"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/reviews/bank/", mock_server.uri());
    let outcome = fetcher(&fast_fetch_config()).fetch(&url).await;

    match outcome {
        FetchOutcome::Page { body, attempts } => {
            assert!(body.contains("reviews"));
            assert_eq!(attempts, 1);
        }
        other => panic!("Expected page, got {:?}", other),
    }
}

#[tokio::test]
async fn test_delay_precedes_first_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    let fetcher = fetcher_with(&fast_fetch_config(), DelayWindow::from_secs(0.2, 0.25));
    let start = Instant::now();
    let outcome = fetcher.fetch(&mock_server.uri()).await;

    assert!(outcome.is_page());
    assert!(start.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn test_block_page_retried_once_then_blocked() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body>Please solve the CAPTCHA to continue</body></html>"),
        )
        .mount(&mock_server)
        .await;

    let config = FetchConfig {
        max_attempts: 2,
        ..fast_fetch_config()
    };

    let start = Instant::now();
    let outcome = fetcher(&config).fetch(&mock_server.uri()).await;
    let elapsed = start.elapsed();

    assert!(matches!(outcome, FetchOutcome::Blocked { attempts: 2 }));
    assert_eq!(request_count(&mock_server).await, 2);
    assert!(
        elapsed >= Duration::from_millis(300),
        "Block cooldown not observed: {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_block_cooldown_adds_to_request_delay() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("captcha"))
        .mount(&mock_server)
        .await;

    let config = FetchConfig {
        max_attempts: 2,
        block_cooldown: 0.3,
        ..fast_fetch_config()
    };
    let fetcher = fetcher_with(&config, DelayWindow::from_secs(0.2, 0.2));

    let start = Instant::now();
    let outcome = fetcher.fetch(&mock_server.uri()).await;
    let elapsed = start.elapsed();

    assert!(matches!(outcome, FetchOutcome::Blocked { attempts: 2 }));
    // Delay, attempt, cooldown, delay again, attempt
    assert!(
        elapsed >= Duration::from_millis(200 + 300 + 200),
        "Retry skipped the request delay: {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_localized_block_marker_detected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<h1>ДОСТУП ЗАПРЕЩЕН</h1>"),
        )
        .mount(&mock_server)
        .await;

    let config = FetchConfig {
        max_attempts: 1,
        ..fast_fetch_config()
    };
    let outcome = fetcher(&config).fetch(&mock_server.uri()).await;

    assert!(matches!(outcome, FetchOutcome::Blocked { attempts: 1 }));
    assert_eq!(request_count(&mock_server).await, 1);
}

#[tokio::test]
async fn test_block_then_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("captcha"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<div>real page</div>"))
        .mount(&mock_server)
        .await;

    let outcome = fetcher(&fast_fetch_config()).fetch(&mock_server.uri()).await;

    match outcome {
        FetchOutcome::Page { body, attempts } => {
            assert!(body.contains("real page"));
            assert_eq!(attempts, 2);
        }
        other => panic!("Expected page after retry, got {:?}", other),
    }
}

#[tokio::test]
async fn test_timeouts_exhaust_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("slow")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let config = FetchConfig {
        max_attempts: 3,
        request_timeout: 0.2,
        timeout_cooldown: 0.5,
        ..fast_fetch_config()
    };

    let start = Instant::now();
    let outcome = fetcher(&config).fetch(&mock_server.uri()).await;
    let elapsed = start.elapsed();

    assert!(matches!(
        outcome,
        FetchOutcome::Failed(FetchFailure::Timeout { attempts: 3 })
    ));
    assert_eq!(request_count(&mock_server).await, 3);
    // Three request timeouts plus two cooldowns between them
    assert!(
        elapsed >= Duration::from_millis(3 * 200 + 2 * 500),
        "Timeout cooldowns not observed: {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_http_errors_are_not_retried() {
    for (status, expected) in [
        (403, FetchFailure::Forbidden),
        (429, FetchFailure::RateLimited),
        (404, FetchFailure::HttpStatus { status: 404 }),
        (503, FetchFailure::HttpStatus { status: 503 }),
    ] {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&mock_server)
            .await;

        let outcome = fetcher(&fast_fetch_config()).fetch(&mock_server.uri()).await;

        match outcome {
            FetchOutcome::Failed(failure) => assert_eq!(failure, expected),
            other => panic!("Expected failure for {}, got {:?}", status, other),
        }
        assert_eq!(request_count(&mock_server).await, 1);
    }
}

#[tokio::test]
async fn test_connection_error_is_not_retried() {
    // Bind and release a port so nothing listens on it
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let start = Instant::now();
    let outcome = fetcher(&fast_fetch_config())
        .fetch(&format!("http://127.0.0.1:{}/", port))
        .await;

    assert!(matches!(
        outcome,
        FetchOutcome::Failed(FetchFailure::Network { .. })
    ));
    // No cooldown was taken
    assert!(start.elapsed() < Duration::from_millis(300));
}
