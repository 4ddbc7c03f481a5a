use review_harvester::config::{Config, PacingConfig, Placeholders};
use review_harvester::crawler::{
    build_http_client, harvest, DelayWindow, PageFetcher, Paginator, RateLimiter, RunCoordinator,
};
use review_harvester::extract::ListingExtractor;
use review_harvester::ScrapeError;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING_PAGE: &str = r#"
<html><body>
  <div class="item status4">
    <a class="review-title" href="/review_501.html">Fast card delivery</a>
    <meta itemprop="ratingValue" content="5">
    <div class="review-teaser">Card arrived in two days.</div>
    <span class="review-postdate">3 March 2024</span>
    <span itemprop="name">maria_k</span>
  </div>
  <div class="item status10">
    <a class="review-title" href="/review_502.html">No stars shown here</a>
    <div class="review-teaser">The rating widget did not render.</div>
  </div>
  <div class="item status4">
    <a class="review-title" href="/review_503.html">Queue at the branch</a>
    <div data-rating="2"></div>
    <div class="review-teaser">Waited an hour.</div>
    <span class="review-postdate">5 March 2024</span>
    <span class="user-login">petrov</span>
  </div>
</body></html>
"#;

const EMPTY_PAGE: &str = "<html><body><p>Nothing here yet</p></body></html>";

fn single_review_page(slug: &str, title: &str, rating: u8) -> String {
    format!(
        r#"<html><body>
  <div class="item status4">
    <a class="review-title" href="/{slug}.html">{title}</a>
    <meta itemprop="ratingValue" content="{rating}">
    <div class="review-teaser">Teaser for {title}</div>
  </div>
</body></html>"#
    )
}

/// A config pointed at the mock server with near-zero pacing
fn test_config(server: &MockServer, output_dir: &Path) -> Config {
    let mut config = Config::default();
    config.target.base_url = format!("{}/reviews/bank/", server.uri());
    config.target.pages_per_rating = 1;
    config.pacing = PacingConfig {
        min_delay: 0.0,
        max_delay: 0.01,
        detail_min_delay: 0.0,
        detail_max_delay: 0.01,
        page_pause_min: 0.0,
        page_pause_max: 0.01,
    };
    config.fetch.max_attempts = 2;
    config.fetch.request_timeout = 5.0;
    config.fetch.block_cooldown = 0.05;
    config.fetch.timeout_cooldown = 0.05;
    config.output.output_dir = output_dir.to_string_lossy().to_string();
    config
}

async fn mount_fallback(server: &MockServer) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(EMPTY_PAGE))
        .mount(server)
        .await;
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_full_run_buckets_reviews_by_rating() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("dataset");

    Mock::given(method("GET"))
        .and(path("/reviews/bank/"))
        .and(query_param("ratio", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING_PAGE))
        .mount(&mock_server)
        .await;
    mount_fallback(&mock_server).await;

    let config = test_config(&mock_server, &output);
    let stats = harvest(&config).await.unwrap();

    assert_eq!(stats.total_reviews, 3);
    assert_eq!(stats.saved_reviews, 2);
    assert_eq!(stats.errors, 1);
    assert_eq!(stats.failed_pages, 0);

    // Stored by the review's own rating, not the bucket it was listed under
    assert_eq!(files_in(&output.join("5")), vec!["0001.txt"]);
    assert_eq!(files_in(&output.join("2")), vec!["0001.txt"]);
    for rating in ["1", "3", "4"] {
        assert!(output.join(rating).is_dir());
        assert!(files_in(&output.join(rating)).is_empty());
    }

    let record = fs::read_to_string(output.join("5").join("0001.txt")).unwrap();
    assert!(record.contains("TITLE: Fast card delivery"));
    assert!(record.contains("Author: maria_k"));
    assert!(record.contains("Date: 3 March 2024"));
    assert!(record.contains("Rating: 5 / 5"));
    assert!(record.contains(&format!("Link: {}/review_501.html", mock_server.uri())));
    assert!(record.contains("Card arrived in two days."));

    let record = fs::read_to_string(output.join("2").join("0001.txt")).unwrap();
    assert!(record.contains("Author: petrov"));
    assert!(record.contains("Rating: 2 / 5"));

    // One listing request per rating bucket
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 5);
}

#[tokio::test]
async fn test_pages_are_walked_in_order() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/reviews/bank/"))
        .and(query_param("ratio", "3"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(single_review_page(
                "review_1",
                "First page review",
                3,
            )),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reviews/bank/2/"))
        .and(query_param("ratio", "3"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(single_review_page(
                "review_2",
                "Second page review",
                3,
            )),
        )
        .mount(&mock_server)
        .await;
    mount_fallback(&mock_server).await;

    let mut config = test_config(&mock_server, temp_dir.path());
    config.target.pages_per_rating = 2;

    let stats = harvest(&config).await.unwrap();
    assert_eq!(stats.saved_reviews, 2);
    assert_eq!(stats.errors, 0);

    let bucket = temp_dir.path().join("3");
    let first = fs::read_to_string(bucket.join("0001.txt")).unwrap();
    let second = fs::read_to_string(bucket.join("0002.txt")).unwrap();
    assert!(first.contains("First page review"));
    assert!(second.contains("Second page review"));

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 10);
}

#[tokio::test]
async fn test_pages_of_a_bucket_are_spaced_by_page_pause() {
    let mock_server = MockServer::start().await;
    mount_fallback(&mock_server).await;

    let mut config = test_config(&mock_server, Path::new("unused"));
    config.target.pages_per_rating = 3;
    config.pacing.page_pause_min = 0.3;
    config.pacing.page_pause_max = 0.3;

    let client = build_http_client(&config.fetch).unwrap();
    let limiter = RateLimiter::new(DelayWindow::from_secs(0.0, 0.0));
    let fetcher = PageFetcher::new(client, limiter, &config.fetch);
    let extractor =
        ListingExtractor::new(Placeholders::default(), Url::parse(&mock_server.uri()).unwrap())
            .unwrap();
    let paginator = Paginator::new(fetcher, extractor, &config.target, &config.pacing).unwrap();

    let start = Instant::now();
    let bucket = paginator.harvest_bucket(4).await;
    let elapsed = start.elapsed();

    assert_eq!(bucket.pages_fetched, 3);
    // One pause between each pair of pages, none after the last
    assert!(
        elapsed >= Duration::from_millis(2 * 300),
        "Page pause not observed: {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_full_text_replaces_teaser() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/reviews/bank/"))
        .and(query_param("ratio", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_string(single_review_page(
            "review_77",
            "Mobile app",
            4,
        )))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/review_77.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
                <div class="review-body">
                  <script>trackView();</script>
                  <p>The app works well.</p>
                  <p>Transfers are instant.</p>
                </div>
              </body></html>"#,
        ))
        .mount(&mock_server)
        .await;
    mount_fallback(&mock_server).await;

    let mut config = test_config(&mock_server, temp_dir.path());
    config.output.full_text = true;

    let stats = harvest(&config).await.unwrap();
    assert_eq!(stats.saved_reviews, 1);
    assert_eq!(stats.enriched_reviews, 1);

    let record = fs::read_to_string(temp_dir.path().join("4").join("0001.txt")).unwrap();
    assert!(record.contains("The app works well.\nTransfers are instant."));
    assert!(!record.contains("trackView"));
    assert!(!record.contains("Teaser for Mobile app"));
}

#[tokio::test]
async fn test_missing_detail_keeps_teaser() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/reviews/bank/"))
        .and(query_param("ratio", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(single_review_page(
            "review_9",
            "Blocked account",
            1,
        )))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/review_9.html"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    mount_fallback(&mock_server).await;

    let mut config = test_config(&mock_server, temp_dir.path());
    config.output.full_text = true;

    let stats = harvest(&config).await.unwrap();
    assert_eq!(stats.saved_reviews, 1);
    assert_eq!(stats.enriched_reviews, 0);

    let record = fs::read_to_string(temp_dir.path().join("1").join("0001.txt")).unwrap();
    assert!(record.contains("Teaser for Blocked account"));
}

#[tokio::test]
async fn test_failed_pages_do_not_abort_run() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server, temp_dir.path());
    let stats = harvest(&config).await.unwrap();

    assert_eq!(stats.failed_pages, 5);
    assert_eq!(stats.total_reviews, 0);
    assert_eq!(stats.saved_reviews, 0);
    assert_eq!(stats.success_rate(), None);
    for rating in 1..=5 {
        assert!(files_in(&temp_dir.path().join(rating.to_string())).is_empty());
    }
}

#[tokio::test]
async fn test_blocked_listing_counts_as_failed_page() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(query_param("ratio", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Captcha required</h1>"))
        .mount(&mock_server)
        .await;
    mount_fallback(&mock_server).await;

    let config = test_config(&mock_server, temp_dir.path());
    let stats = harvest(&config).await.unwrap();

    assert_eq!(stats.failed_pages, 1);
    // Two attempts for the blocked bucket, one for each of the others
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 6);
}

#[tokio::test]
async fn test_unwritable_output_fails_before_any_request() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    mount_fallback(&mock_server).await;

    let blocker = temp_dir.path().join("not-a-dir");
    fs::write(&blocker, "file").unwrap();

    let config = test_config(&mock_server, &blocker.join("dataset"));
    let coordinator = RunCoordinator::new(&config).unwrap();
    let result = coordinator.run().await;

    assert!(matches!(result, Err(ScrapeError::Setup { .. })));
    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_census_after_run() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/reviews/bank/"))
        .and(query_param("ratio", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING_PAGE))
        .mount(&mock_server)
        .await;
    mount_fallback(&mock_server).await;

    let config = test_config(&mock_server, temp_dir.path());
    let coordinator = RunCoordinator::new(&config).unwrap();
    coordinator.run().await.unwrap();

    let counts = coordinator.store().census().unwrap();
    assert_eq!(counts.get(&5), Some(&1));
    assert_eq!(counts.get(&2), Some(&1));
    assert_eq!(counts.get(&3), Some(&0));
}
