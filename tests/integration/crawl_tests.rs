//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use smoke_crawler::config::{CrawlerConfiguration, OutputConfiguration};
use smoke_crawler::crawler::Coordinator;
use smoke_crawler::report::{CrawlOutcome, NetworkErrorKind, SkipReason};
use smoke_crawler::state::CrawlState;
use smoke_crawler::SmokeError;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration: sequential, no pacing, robots ignored
fn create_test_config() -> CrawlerConfiguration {
    CrawlerConfiguration {
        concurrency: 1,
        delay_between_requests: Duration::ZERO,
        respect_robots: false,
        request_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><body>{}</body></html>", body),
        "text/html",
    )
}

async fn mount_page(server: &MockServer, route: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(template)
        .mount(server)
        .await;
}

async fn run(config: CrawlerConfiguration, base_url: &str) -> smoke_crawler::CrawlReport {
    Coordinator::new(config)
        .expect("Failed to create coordinator")
        .run(base_url, &OutputConfiguration::stdout(), CancellationToken::new())
        .await
        .expect("Crawl failed")
}

fn status_of(report: &smoke_crawler::CrawlReport, url: &str) -> Option<u16> {
    report.get(url).and_then(|r| r.outcome.status_code())
}

#[tokio::test]
async fn test_full_crawl_records_every_outcome() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        html(r#"<a href="/ok">ok</a> <a href="/missing">missing</a> <a href="/broken">broken</a>"#),
    )
    .await;
    mount_page(&server, "/ok", html(r#"<a href="/">home</a>"#)).await;
    mount_page(&server, "/missing", ResponseTemplate::new(404)).await;
    mount_page(&server, "/broken", ResponseTemplate::new(500)).await;

    let report = run(create_test_config(), &base).await;

    assert_eq!(report.status, CrawlState::Completed);
    assert_eq!(report.len(), 4);
    assert_eq!(status_of(&report, &format!("{}/", base)), Some(200));
    assert_eq!(status_of(&report, &format!("{}/ok", base)), Some(200));
    assert_eq!(status_of(&report, &format!("{}/missing", base)), Some(404));
    assert_eq!(status_of(&report, &format!("{}/broken", base)), Some(500));

    let root = report.get(&format!("{}/", base)).unwrap();
    assert!(matches!(
        &root.outcome,
        CrawlOutcome::Success { content_type: Some(ct), .. } if ct.starts_with("text/html")
    ));

    let missing = report.get(&format!("{}/missing", base)).unwrap();
    assert_eq!(missing.depth, 1);
    assert_eq!(missing.parent.as_deref(), Some(format!("{}/", base).as_str()));

    let summary = report.summary();
    assert_eq!(summary.successes, 2);
    assert_eq!(summary.client_errors, 1);
    assert_eq!(summary.server_errors, 1);
    assert_eq!(summary.problems(), 2);
}

#[tokio::test]
async fn test_depth_zero_crawls_only_base() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", html(r#"<a href="/a">a</a> <a href="/b">b</a>"#)).await;

    let config = CrawlerConfiguration {
        maximum_crawl_depth: Some(0),
        ..create_test_config()
    };
    let report = run(config, &base).await;

    assert_eq!(report.status, CrawlState::Completed);
    assert_eq!(report.len(), 1);

    // Links are still discovered even though none are crawled
    let root = report.get(&format!("{}/", base)).unwrap();
    assert_eq!(root.discovered_links.len(), 2);
}

#[tokio::test]
async fn test_nofollow_links_rejected_when_configured() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        html(r#"<a href="/followed">yes</a> <a rel="nofollow" href="/ignored">no</a>"#),
    )
    .await;
    mount_page(&server, "/followed", html("")).await;
    mount_page(&server, "/ignored", html("")).await;

    let config = CrawlerConfiguration {
        reject_no_follow_links: true,
        ..create_test_config()
    };
    let report = run(config.clone(), &base).await;

    assert!(report.get(&format!("{}/followed", base)).is_some());
    assert!(report.get(&format!("{}/ignored", base)).is_none());

    // Without the flag both are crawled
    let report = run(create_test_config(), &base).await;
    assert!(report.get(&format!("{}/ignored", base)).is_some());
}

#[tokio::test]
async fn test_crawl_count_includes_base_url() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        html(r#"<a href="/one">1</a> <a href="/two">2</a> <a href="/three">3</a>"#),
    )
    .await;
    mount_page(&server, "/one", html("")).await;
    mount_page(&server, "/two", html("")).await;
    mount_page(&server, "/three", html("")).await;

    let config = CrawlerConfiguration {
        maximum_crawl_count: NonZeroUsize::new(2),
        ..create_test_config()
    };
    let report = run(config, &base).await;

    assert_eq!(report.status, CrawlState::Completed);
    assert_eq!(report.len(), 2);
    assert!(report.get(&format!("{}/", base)).is_some());
    assert!(report.get(&format!("{}/one", base)).is_some());
}

#[tokio::test]
async fn test_robots_disallowed_url_is_skipped() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/robots.txt",
        ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"),
    )
    .await;
    mount_page(
        &server,
        "/",
        html(r#"<a href="/private/data">p</a> <a href="/public">q</a>"#),
    )
    .await;
    mount_page(&server, "/public", html("")).await;
    Mock::given(method("GET"))
        .and(path("/private/data"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = CrawlerConfiguration {
        respect_robots: true,
        ..create_test_config()
    };
    let report = run(config, &base).await;

    let private = report.get(&format!("{}/private/data", base)).unwrap();
    assert_eq!(
        private.outcome,
        CrawlOutcome::Skipped {
            reason: SkipReason::RobotsDenied
        }
    );
    assert_eq!(status_of(&report, &format!("{}/public", base)), Some(200));
    assert_eq!(report.summary().skipped, 1);
}

#[tokio::test]
async fn test_missing_robots_allows_everything() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/robots.txt", ResponseTemplate::new(404)).await;
    mount_page(&server, "/", html(r#"<a href="/private">p</a>"#)).await;
    mount_page(&server, "/private", html("")).await;

    let config = CrawlerConfiguration {
        respect_robots: true,
        ..create_test_config()
    };
    let report = run(config, &base).await;

    assert_eq!(status_of(&report, &format!("{}/private", base)), Some(200));
    assert_eq!(report.summary().skipped, 0);
}

#[tokio::test]
async fn test_redirected_robots_is_respected() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/robots.txt",
        ResponseTemplate::new(301).insert_header("location", "/robots-live.txt"),
    )
    .await;
    mount_page(
        &server,
        "/robots-live.txt",
        ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"),
    )
    .await;
    mount_page(&server, "/", html(r#"<a href="/private/data">p</a>"#)).await;
    Mock::given(method("GET"))
        .and(path("/private/data"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = CrawlerConfiguration {
        respect_robots: true,
        ..create_test_config()
    };
    let report = run(config, &base).await;

    let private = report.get(&format!("{}/private/data", base)).unwrap();
    assert_eq!(
        private.outcome,
        CrawlOutcome::Skipped {
            reason: SkipReason::RobotsDenied
        }
    );
}

#[tokio::test]
async fn test_base_url_timeout_completes_with_timeout_result() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        html("slow").set_delay(Duration::from_secs(3)),
    )
    .await;

    let config = CrawlerConfiguration {
        request_timeout: Duration::from_millis(300),
        ..create_test_config()
    };
    let report = run(config, &base).await;

    assert_eq!(report.status, CrawlState::Completed);
    assert_eq!(report.len(), 1);
    assert_eq!(report.results[0].outcome, CrawlOutcome::Timeout);
    assert_eq!(report.summary().timeouts, 1);
}

#[tokio::test]
async fn test_duplicate_links_crawled_once() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        html(r#"<a href="/a">1</a> <a href="/a#top">2</a> <a href="./a">3</a>"#),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html(r#"<a href="/">home</a>"#))
        .expect(1)
        .mount(&server)
        .await;

    let report = run(create_test_config(), &base).await;

    assert_eq!(report.len(), 2);
    let root = report.get(&format!("{}/", base)).unwrap();
    assert_eq!(root.discovered_links.len(), 3);
}

#[tokio::test]
async fn test_truncated_body_hides_late_links() {
    let server = MockServer::start().await;
    let base = server.uri();

    let padding = "x".repeat(4096);
    mount_page(
        &server,
        "/",
        html(&format!(r#"<p>{}</p><a href="/late">late</a>"#, padding)),
    )
    .await;
    mount_page(&server, "/late", html("")).await;

    let config = CrawlerConfiguration {
        maximum_response_size: NonZeroUsize::new(256),
        ..create_test_config()
    };
    let report = run(config, &base).await;

    assert_eq!(report.len(), 1);
    assert!(report.results[0].outcome.is_truncated());
    assert_eq!(report.summary().truncated, 1);
}

#[tokio::test]
async fn test_redirect_chain_recorded() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", html(r#"<a href="/old">old</a>"#)).await;
    mount_page(
        &server,
        "/old",
        ResponseTemplate::new(301).insert_header("location", "/new"),
    )
    .await;
    mount_page(&server, "/new", html("")).await;

    let report = run(create_test_config(), &base).await;

    let old = report.get(&format!("{}/old", base)).unwrap();
    assert_eq!(old.redirect_chain, vec![format!("{}/old", base)]);
    match &old.outcome {
        CrawlOutcome::Success {
            status_code,
            final_url,
            ..
        } => {
            assert_eq!(*status_code, 200);
            assert_eq!(final_url, &format!("{}/new", base));
        }
        other => panic!("Expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_out_of_scope_links_not_crawled() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        html(r#"<a href="http://elsewhere.invalid/page">ext</a> <a href="/in">in</a>"#),
    )
    .await;
    mount_page(&server, "/in", html("")).await;

    let report = run(create_test_config(), &base).await;

    assert_eq!(report.len(), 2);
    let root = report.get(&format!("{}/", base)).unwrap();
    assert!(root
        .discovered_links
        .contains(&"http://elsewhere.invalid/page".to_string()));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let report = run(create_test_config(), "http://127.0.0.1:9/").await;

    assert_eq!(report.status, CrawlState::Completed);
    assert_eq!(report.len(), 1);
    assert!(matches!(
        report.results[0].outcome,
        CrawlOutcome::NetworkError {
            kind: NetworkErrorKind::ConnectionRefused,
            ..
        }
    ));
}

#[tokio::test]
async fn test_cancellation_keeps_partial_results() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", html(r#"<a href="/slow">slow</a>"#)).await;
    mount_page(
        &server,
        "/slow",
        html("").set_delay(Duration::from_secs(10)),
    )
    .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        trigger.cancel();
    });

    let config = CrawlerConfiguration {
        request_timeout: Duration::from_secs(30),
        ..create_test_config()
    };
    let report = Coordinator::new(config)
        .unwrap()
        .run(&base, &OutputConfiguration::stdout(), cancel)
        .await
        .unwrap();

    assert_eq!(report.status, CrawlState::Aborted);
    assert_eq!(report.len(), 1);
    assert!(report.get(&format!("{}/", base)).is_some());
    assert!(report.get(&format!("{}/slow", base)).is_none());
}

#[tokio::test]
async fn test_invalid_base_url_is_rejected() {
    let result = Coordinator::new(create_test_config())
        .unwrap()
        .run(
            "not a url",
            &OutputConfiguration::stdout(),
            CancellationToken::new(),
        )
        .await;

    assert!(matches!(result, Err(SmokeError::InvalidBaseUrl { .. })));
}

#[tokio::test]
async fn test_crawl_writes_every_sink() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", html(r#"<a href="/gone">gone</a>"#)).await;
    mount_page(&server, "/gone", ResponseTemplate::new(404)).await;

    let dir = TempDir::new().unwrap();
    let json_path = dir.path().join("report.json");
    let text_path = dir.path().join("report.txt");
    let output = OutputConfiguration {
        outputs: BTreeSet::from([
            json_path.display().to_string(),
            text_path.display().to_string(),
        ]),
        filters: Default::default(),
    };

    let report = smoke_crawler::crawl(
        &base,
        create_test_config(),
        &output,
        CancellationToken::new(),
    )
    .await
    .unwrap();
    assert_eq!(report.len(), 2);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["summary"]["total"], 2);
    assert_eq!(json["summary"]["client_errors"], 1);
    assert_eq!(json["report"]["status"], "completed");

    let text = std::fs::read_to_string(&text_path).unwrap();
    assert!(text.contains(&format!("{}/gone", base)));
}

/// Paths of the report's results, in report order
fn paths(report: &smoke_crawler::CrawlReport) -> Vec<String> {
    report
        .results
        .iter()
        .map(|r| url::Url::parse(&r.url).unwrap().path().to_string())
        .collect()
}

#[tokio::test]
async fn test_concurrent_crawl_keeps_breadth_first_depths() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", html(r#"<a href="/slow">s</a> <a href="/fast">f</a>"#)).await;
    mount_page(
        &server,
        "/slow",
        html(r#"<a href="/x">x</a>"#).set_delay(Duration::from_millis(800)),
    )
    .await;
    mount_page(&server, "/fast", html(r#"<a href="/mid">m</a>"#)).await;
    mount_page(&server, "/mid", html(r#"<a href="/x">x</a>"#)).await;
    mount_page(&server, "/x", html(r#"<a href="/y">y</a>"#)).await;
    mount_page(&server, "/y", html("")).await;

    let config = CrawlerConfiguration {
        concurrency: 2,
        maximum_crawl_depth: Some(3),
        ..create_test_config()
    };
    let report = run(config, &base).await;

    // /fast completes long before /slow, but /x is still reached at depth 2
    let x = report.get(&format!("{}/x", base)).unwrap();
    assert_eq!(x.depth, 2);
    assert_eq!(x.parent.as_deref(), Some(format!("{}/slow", base).as_str()));

    let y = report.get(&format!("{}/y", base)).unwrap();
    assert_eq!(y.depth, 3);
    assert_eq!(y.outcome.status_code(), Some(200));

    assert_eq!(paths(&report), vec!["/", "/slow", "/fast", "/mid", "/x", "/y"]);
}

#[tokio::test]
async fn test_concurrent_workers_fetch_shared_link_once() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        html(r#"<a href="/a">a</a> <a href="/b">b</a> <a href="/c">c</a>"#),
    )
    .await;
    for page in ["/a", "/b", "/c"] {
        mount_page(
            &server,
            page,
            html(r#"<a href="/shared">s</a> <a href="/">home</a>"#),
        )
        .await;
    }
    Mock::given(method("GET"))
        .and(path("/shared"))
        .respond_with(html(""))
        .expect(1)
        .mount(&server)
        .await;

    let config = CrawlerConfiguration {
        concurrency: 4,
        ..create_test_config()
    };
    let report = run(config, &base).await;

    let unique: BTreeSet<_> = report.results.iter().map(|r| r.url.clone()).collect();
    assert_eq!(report.len(), 5);
    assert_eq!(unique.len(), 5);
    assert_eq!(report.get(&format!("{}/shared", base)).unwrap().depth, 2);
}

#[tokio::test]
async fn test_report_order_ignores_completion_order() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        html(r#"<a href="/first">1</a> <a href="/second">2</a> <a href="/third">3</a>"#),
    )
    .await;
    mount_page(
        &server,
        "/first",
        html("").set_delay(Duration::from_millis(600)),
    )
    .await;
    mount_page(
        &server,
        "/second",
        html("").set_delay(Duration::from_millis(300)),
    )
    .await;
    mount_page(&server, "/third", html("")).await;

    let config = CrawlerConfiguration {
        concurrency: 4,
        ..create_test_config()
    };
    let report = run(config, &base).await;

    assert_eq!(paths(&report), vec!["/", "/first", "/second", "/third"]);
    let sequences: Vec<_> = report.results.iter().map(|r| r.sequence).collect();
    assert_eq!(sequences, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn test_count_limit_holds_with_workers_in_flight() {
    let server = MockServer::start().await;
    let base = server.uri();

    let links: String = (0..10)
        .map(|i| format!(r#"<a href="/p{}">{}</a> "#, i, i))
        .collect();
    mount_page(&server, "/", html(&links)).await;
    for i in 0..10 {
        mount_page(
            &server,
            &format!("/p{}", i),
            html(&format!(r#"<a href="/q{}">next</a>"#, i))
                .set_delay(Duration::from_millis(100)),
        )
        .await;
    }

    let config = CrawlerConfiguration {
        concurrency: 4,
        maximum_crawl_count: NonZeroUsize::new(4),
        ..create_test_config()
    };
    let report = run(config, &base).await;

    assert_eq!(report.len(), 4);
    assert_eq!(paths(&report), vec!["/", "/p0", "/p1", "/p2"]);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);
}

#[tokio::test]
async fn test_delay_is_shared_across_workers() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        html(r#"<a href="/a">a</a> <a href="/b">b</a> <a href="/c">c</a>"#),
    )
    .await;
    for page in ["/a", "/b", "/c"] {
        mount_page(&server, page, html("")).await;
    }

    let config = CrawlerConfiguration {
        concurrency: 4,
        delay_between_requests: Duration::from_millis(200),
        ..create_test_config()
    };

    let started = Instant::now();
    let report = run(config, &base).await;
    let elapsed = started.elapsed();

    // Four requests need three full intervals even with four workers
    assert_eq!(report.len(), 4);
    assert!(elapsed >= Duration::from_millis(600), "took {:?}", elapsed);
}

#[tokio::test]
async fn test_robots_crawl_delay_raises_interval() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/robots.txt",
        ResponseTemplate::new(200).set_body_string("User-agent: *\nCrawl-delay: 1\n"),
    )
    .await;
    mount_page(&server, "/", html(r#"<a href="/a">a</a>"#)).await;
    mount_page(&server, "/a", html("")).await;

    let config = CrawlerConfiguration {
        concurrency: 4,
        respect_robots: true,
        delay_between_requests: Duration::ZERO,
        ..create_test_config()
    };

    let started = Instant::now();
    let report = run(config, &base).await;
    let elapsed = started.elapsed();

    assert_eq!(status_of(&report, &format!("{}/a", base)), Some(200));
    assert!(elapsed >= Duration::from_secs(1), "took {:?}", elapsed);
}
