//! End-to-end scenarios for the batch tester with a stubbed probe client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use mdc_cookies::report::aggregate;
use mdc_cookies::{
    ConfigDocument, CookieStore, DomainTestHarness, Outcome, ProbeClient, ProbeRequest,
    ProbeResponse, Recommendation, TargetRegistry, TransportError,
};

// ─────────────────────── helpers ───────────────────────

/// Stub client answering by URL and counting calls.
#[derive(Default)]
struct StubClient {
    replies: HashMap<String, Result<(u16, String), TransportError>>,
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

impl StubClient {
    fn reply(mut self, url: &str, status: u16, body: &str) -> Self {
        self.replies
            .insert(url.to_string(), Ok((status, body.to_string())));
        self
    }

    fn fail(mut self, url: &str, err: TransportError) -> Self {
        self.replies.insert(url.to_string(), Err(err));
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProbeClient for StubClient {
    async fn send(&self, request: ProbeRequest) -> Result<ProbeResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(request.url.clone());
        match self.replies.get(&request.url) {
            Some(Ok((status, body))) => Ok(ProbeResponse {
                status: *status,
                body: body.clone(),
                headers: Vec::new(),
                elapsed: Duration::from_millis(100),
            }),
            Some(Err(e)) => Err(e.clone()),
            None => Err(TransportError::Connect("no stub".into())),
        }
    }
}

const JAVBUS_URL: &str = "https://www.javbus.com/SSIS-001";
const JAVDB_URL: &str = "https://javdb.com/search?q=SSIS-001";
const AVMOO_URL: &str = "https://avmoo.com/en/search/SSIS-001";

fn javbus_store() -> CookieStore {
    CookieStore::load([("www.javbus.com", "dv=1,existmag=mag,PHPSESSID=abc123def456")])
}

// ═══════════════════════════════════════════════════════
// SCENARIOS
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_working_cookies_report_success() {
    let client = StubClient::default().reply(JAVBUS_URL, 200, "<html>movie info star...</html>");
    let store = javbus_store();
    let registry = TargetRegistry::builtin();
    let harness = DomainTestHarness::new(&client, &store, &registry);

    let results = harness.test_all(Duration::ZERO).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].outcome, Outcome::Success);

    let summary = aggregate(&results);
    assert_eq!((summary.success_count, summary.total_count), (1, 1));
    assert_eq!(summary.recommendation, Recommendation::FullyOperational);
    assert!(summary.is_operational());
}

#[tokio::test]
async fn test_challenge_page_is_blocked_despite_success_text() {
    let client = StubClient::default().reply(
        JAVBUS_URL,
        200,
        "Just a moment... checking your browser <div class=movie>star</div>",
    );
    let store = javbus_store();
    let registry = TargetRegistry::builtin();
    let harness = DomainTestHarness::new(&client, &store, &registry);

    let result = harness.test("www.javbus.com").await;
    assert_eq!(result.outcome, Outcome::Blocked);
    assert_eq!(result.http_status, Some(200));
}

#[tokio::test]
async fn test_empty_cookie_string_is_skipped_without_network() {
    let doc = ConfigDocument::parse("[cookies]\nwww.javbus.com =\n").unwrap();
    let store = doc.cookie_store().unwrap();
    assert!(!store.contains("www.javbus.com"));

    let client = StubClient::default().reply(JAVBUS_URL, 200, "movie");
    let registry = TargetRegistry::builtin();
    let harness = DomainTestHarness::new(&client, &store, &registry);

    let result = harness.test("www.javbus.com").await;
    assert_eq!(result.outcome, Outcome::Skipped);
    assert_eq!(result.reason, "no cookies configured");
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_timeout_lands_in_timeout_group() {
    let client = StubClient::default()
        .fail(
            JAVBUS_URL,
            TransportError::Timeout {
                after: Duration::from_secs(15),
            },
        )
        .reply(JAVDB_URL, 200, "<div class=\"movie-list\">");
    let store = CookieStore::load([
        ("www.javbus.com", "dv=1,PHPSESSID=abc123def456"),
        ("javdb.com", "_jdb_session=xyz"),
    ]);
    let registry = TargetRegistry::builtin();
    let harness = DomainTestHarness::new(&client, &store, &registry);

    let results = harness.test_all(Duration::ZERO).await;
    assert_eq!(results.len(), 2);

    let summary = aggregate(&results);
    assert_eq!(summary.domains_with(Outcome::Timeout), ["www.javbus.com".to_string()]);
    assert_eq!(summary.domains_with(Outcome::Success), ["javdb.com".to_string()]);
    assert_eq!(summary.recommendation, Recommendation::ReextractFailing);
}

#[tokio::test]
async fn test_one_bad_domain_does_not_stop_the_run() {
    let client = StubClient::default()
        .fail(AVMOO_URL, TransportError::Other("boom".into()))
        .reply(JAVBUS_URL, 403, "denied")
        .reply(JAVDB_URL, 500, "");
    let store = CookieStore::load([
        ("avmoo.com", "a=1"),
        ("javdb.com", "b=2"),
        ("www.javbus.com", "c=3"),
        ("unknown.example", "d=4"),
    ]);
    let registry = TargetRegistry::builtin();
    let harness = DomainTestHarness::new(&client, &store, &registry);

    let results = harness.test_all(Duration::ZERO).await;
    let outcomes: Vec<(&str, Outcome)> = results
        .iter()
        .map(|r| (r.domain.as_str(), r.outcome))
        .collect();
    assert_eq!(
        outcomes,
        vec![
            ("avmoo.com", Outcome::NetworkError),
            ("javdb.com", Outcome::NetworkError),
            ("unknown.example", Outcome::Skipped),
            ("www.javbus.com", Outcome::Forbidden),
        ]
    );
    assert_eq!(results[1].reason, "HTTP 500");
    assert_eq!(client.calls(), 3);

    let summary = aggregate(&results);
    assert_eq!(summary.recommendation, Recommendation::ReextractAll);
}

#[tokio::test]
async fn test_domains_probed_in_sorted_order() {
    let client = StubClient::default();
    let store = CookieStore::load([
        ("www.javbus.com", "a=1"),
        ("avmoo.com", "b=2"),
        ("javdb.com", "c=3"),
    ]);
    let registry = TargetRegistry::builtin();
    let harness = DomainTestHarness::new(&client, &store, &registry);

    harness.test_all(Duration::ZERO).await;
    let urls = client.urls.lock().unwrap().clone();
    assert_eq!(urls, vec![AVMOO_URL, JAVDB_URL, JAVBUS_URL]);
}

#[tokio::test(start_paused = true)]
async fn test_throttle_between_probes() {
    let client = StubClient::default();
    let store = CookieStore::load([
        ("avmoo.com", "a=1"),
        ("javdb.com", "b=2"),
        ("www.javbus.com", "c=3"),
    ]);
    let registry = TargetRegistry::builtin();
    let harness = DomainTestHarness::new(&client, &store, &registry);

    let start = tokio::time::Instant::now();
    let results = harness.test_all(Duration::from_secs(1)).await;
    assert_eq!(results.len(), 3);
    // Two gaps between three probes, none after the last one.
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(2), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(3), "elapsed {elapsed:?}");
}
