//! End-to-end scrape scenarios against a local mock retailer
use prime_scraper_lib::infrastructure::config::ScraperConfig;
use prime_scraper_lib::{ErrorKind, FetchError, Record, ScrapeError, ScrapeService};
use std::io::Read;
use std::net::TcpListener;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ITEM_PAGE: &str = include_str!("fixtures/item_page.html");
const TITLE_ONLY: &str = include_str!("fixtures/title_only.html");
const CAPTCHA: &str = include_str!("fixtures/captcha.html");

fn config_for(base: &str) -> ScraperConfig {
    ScraperConfig {
        page_url_template: format!("{base}/gp/product/"),
        request_timeout_ms: 2_000,
        ..Default::default()
    }
}

async fn serve_page(server: &MockServer, item_id: &str, response: ResponseTemplate, hits: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/gp/product/{item_id}")))
        .respond_with(response)
        .expect(hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn full_page_yields_complete_record() {
    let server = MockServer::start().await;
    serve_page(&server, "B07XJ8C8F5", ResponseTemplate::new(200).set_body_string(ITEM_PAGE), 1).await;

    let service = ScrapeService::new(config_for(&server.uri())).unwrap();
    let record = service.scrape("B07XJ8C8F5").await.unwrap();

    assert_eq!(
        record,
        Record {
            title: Some("Movie X".into()),
            release_year: Some("2019".into()),
            actors: vec!["A".into(), "B".into(), "C".into()],
            poster: Some("url1".into()),
            similar_ids: vec!["B07ID0001".into(), "B07ID0002".into(), "B07ID0003".into()],
        }
    );

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), "/gp/product/B07XJ8C8F5");
}

#[tokio::test]
async fn invalid_id_makes_no_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ITEM_PAGE))
        .expect(0)
        .mount(&server)
        .await;

    let service = ScrapeService::new(config_for(&server.uri())).unwrap();
    for bad in ["", "B07-XJ8", "../admin", "B07 XJ8"] {
        let err = service.scrape(bad).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{bad:?}");
    }

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn not_found_status_is_fetch_error() {
    let server = MockServer::start().await;
    // Body would extract fine; it must not be looked at
    serve_page(&server, "B0MISSING", ResponseTemplate::new(404).set_body_string(ITEM_PAGE), 1).await;

    let service = ScrapeService::new(config_for(&server.uri())).unwrap();
    let err = service.scrape("B0MISSING").await.unwrap_err();

    assert_eq!(
        err,
        ScrapeError::Fetch(FetchError::HttpStatus {
            url: format!("{}/gp/product/B0MISSING", server.uri()),
            status: 404,
        })
    );
}

#[tokio::test]
async fn slow_page_times_out() {
    let server = MockServer::start().await;
    serve_page(
        &server,
        "B0SLOW",
        ResponseTemplate::new(200)
            .set_body_string(ITEM_PAGE)
            .set_delay(Duration::from_secs(3)),
        1,
    )
    .await;

    let service = ScrapeService::new(config_for(&server.uri())).unwrap();
    let err = service
        .scrape_with_deadline("B0SLOW", Duration::from_millis(200))
        .await
        .unwrap_err();

    assert!(
        matches!(err, ScrapeError::Fetch(FetchError::Timeout { deadline, .. }) if deadline == Duration::from_millis(200)),
        "{err:?}"
    );
}

#[tokio::test]
async fn unrelated_page_is_not_found() {
    let server = MockServer::start().await;
    serve_page(&server, "B0CAPTCHA", ResponseTemplate::new(200).set_body_string(CAPTCHA), 1).await;

    let service = ScrapeService::new(config_for(&server.uri())).unwrap();
    let err = service.scrape("B0CAPTCHA").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn title_only_page_is_partial_record() {
    let server = MockServer::start().await;
    serve_page(&server, "B0TITLE", ResponseTemplate::new(200).set_body_string(TITLE_ONLY), 1).await;

    let service = ScrapeService::new(config_for(&server.uri())).unwrap();
    let record = service.scrape("B0TITLE").await.unwrap();

    assert_eq!(record.title.as_deref(), Some("Movie X"));
    assert_eq!(record.release_year, None);
    assert_eq!(record.poster, None);
    assert!(record.actors.is_empty());
    assert!(record.similar_ids.is_empty());
}

#[tokio::test]
async fn repeated_scrapes_are_identical() {
    let server = MockServer::start().await;
    serve_page(&server, "B07XJ8C8F5", ResponseTemplate::new(200).set_body_string(ITEM_PAGE), 2).await;

    let service = ScrapeService::new(config_for(&server.uri())).unwrap();
    let first = service.scrape("B07XJ8C8F5").await.unwrap();
    let second = service.scrape("B07XJ8C8F5").await.unwrap();

    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );
}

#[tokio::test]
async fn concurrent_scrapes_are_independent() {
    let server = MockServer::start().await;
    serve_page(&server, "B07XJ8C8F5", ResponseTemplate::new(200).set_body_string(ITEM_PAGE), 1).await;
    serve_page(&server, "B0TITLE", ResponseTemplate::new(200).set_body_string(TITLE_ONLY), 1).await;
    serve_page(&server, "B0CAPTCHA", ResponseTemplate::new(200).set_body_string(CAPTCHA), 1).await;

    let service = ScrapeService::new(config_for(&server.uri())).unwrap();
    let (full, partial, missing) = tokio::join!(
        service.scrape("B07XJ8C8F5"),
        service.scrape("B0TITLE"),
        service.scrape("B0CAPTCHA"),
    );

    assert_eq!(full.unwrap().populated_fields(), 5);
    assert_eq!(partial.unwrap().populated_fields(), 1);
    assert_eq!(missing.unwrap_err().kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn server_errors_are_not_retried() {
    let server = MockServer::start().await;
    serve_page(&server, "B0DOWN", ResponseTemplate::new(503), 1).await;

    let config = ScraperConfig {
        retry_on_network_failure: true,
        ..config_for(&server.uri())
    };
    let service = ScrapeService::new(config).unwrap();
    let err = service.scrape("B0DOWN").await.unwrap_err();

    assert!(matches!(err, ScrapeError::Fetch(FetchError::HttpStatus { status: 503, .. })));
}

/// Listener that accepts connections and drops them straight away
/// Accepts one connection, reads the request head and never answers.
/// Yields the result of the read that follows.
fn silent_listener() -> (String, tokio::task::JoinHandle<std::io::Result<usize>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::task::spawn_blocking(move || -> std::io::Result<usize> {
        let (mut stream, _) = listener.accept()?;
        stream.set_read_timeout(Some(Duration::from_secs(5)))?;

        let mut head = Vec::new();
        let mut buf = [0_u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf)?;
            if n == 0 {
                return Ok(0);
            }
            head.extend_from_slice(&buf[..n]);
        }

        stream.read(&mut buf)
    });

    (base, handle)
}

// Needs worker threads: the blocking accept/read must not starve the client's connection task
#[tokio::test(flavor = "multi_thread")]
async fn timed_out_fetch_closes_its_connection() {
    let (base, server) = silent_listener();
    let service = ScrapeService::new(config_for(&base)).unwrap();

    let err = service
        .scrape_with_deadline("B0SLOW", Duration::from_millis(200))
        .await
        .unwrap_err();
    assert!(matches!(err, ScrapeError::Fetch(FetchError::Timeout { .. })), "{err:?}");

    let read_after_timeout = server.await.unwrap();
    assert_eq!(read_after_timeout.unwrap(), 0, "connection still open after deadline");
}

fn dropping_listener() -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            counter.fetch_add(1, Ordering::SeqCst);
            let mut buf = [0_u8; 1024];
            let _ = stream.read(&mut buf);
            drop(stream);
        }
    });

    (base, accepted)
}

#[tokio::test]
async fn transport_failure_is_retried_once_when_enabled() {
    let (base, accepted) = dropping_listener();
    let config = ScraperConfig {
        retry_on_network_failure: true,
        ..config_for(&base)
    };
    let service = ScrapeService::new(config).unwrap();

    let err = service.scrape("B0FLAKY").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NetworkFailure, "{err:?}");
    assert_eq!(accepted.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn transport_failure_is_final_by_default() {
    let (base, accepted) = dropping_listener();
    let service = ScrapeService::new(config_for(&base)).unwrap();

    let err = service.scrape("B0FLAKY").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NetworkFailure, "{err:?}");
    assert_eq!(accepted.load(Ordering::SeqCst), 1);
}
