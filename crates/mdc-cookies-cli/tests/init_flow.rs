//! The initializer loop end to end: scripted answers, a mock site, and a
//! real config file in a temp directory.

use std::collections::VecDeque;

use wiremock::matchers::{header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mdc_cookies::remediation::{
    run_remediation, Console, Notice, Question, Reply, TargetValidator,
};
use mdc_cookies::targets::BLOCK_INDICATORS;
use mdc_cookies::{ConfigDocument, RemediationMachine, RemediationOutcome, TestTarget};
use mdc_cookies_cli::cli::init_cmd::existing_cookies;
use mdc_cookies_cli::config::{read_document, ConfigFileSink};
use mdc_cookies_cli::http::{HttpProbeClient, ProbeClientConfig};

struct Scripted {
    answers: VecDeque<&'static str>,
    notices: Vec<Notice>,
    questions: Vec<Question>,
}

impl Scripted {
    fn new(answers: &[&'static str]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            notices: Vec::new(),
            questions: Vec::new(),
        }
    }
}

impl Console for Scripted {
    fn show(&mut self, notice: &Notice) {
        self.notices.push(notice.clone());
    }

    fn ask(&mut self, question: &Question) -> Reply {
        self.questions.push(question.clone());
        match self.answers.pop_front() {
            Some(answer) => Reply::Answer(answer.to_string()),
            None => Reply::Interrupted,
        }
    }
}

async fn validator(server: &MockServer) -> TargetValidator<HttpProbeClient> {
    let client = HttpProbeClient::new(&ProbeClientConfig::default()).unwrap();
    let target = TestTarget::new(
        "www.javbus.com",
        &format!("{}/SSIS-001", server.uri()),
        &["movie", "info", "star", "genre"],
        BLOCK_INDICATORS,
    );
    TargetValidator::new(client, target)
}

/// Only the session `goodsession123` is accepted.
async fn mount_site(server: &MockServer) {
    Mock::given(method("GET"))
        .and(header("cookie", "dv=1; existmag=mag; PHPSESSID=goodsession123"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<div class=\"movie\">"))
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .with_priority(2)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fresh_setup_writes_config() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".mdc").join("config.ini");

    let mut console = Scripted::new(&["", "", "", "", "goodsession123"]);
    let mut sink = ConfigFileSink::new(path.clone(), ConfigDocument::new());
    let outcome = run_remediation(
        &mut RemediationMachine::new(),
        None,
        &mut console,
        &validator(&server).await,
        &mut sink,
    )
    .await
    .unwrap();

    assert!(matches!(outcome, RemediationOutcome::Configured { .. }));
    let store = read_document(&path).unwrap().cookie_store().unwrap();
    let cookies = store.get("www.javbus.com").unwrap();
    assert_eq!(cookies.len(), 3);
    assert_eq!(cookies[2].value, "goodsession123");
}

#[tokio::test]
async fn test_working_existing_cookies_leave_file_untouched() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.ini");
    let original = "[cookies]\njavbus.com = dv=1,existmag=mag,PHPSESSID=goodsession123\n";
    std::fs::write(&path, original).unwrap();

    let document = read_document(&path).unwrap();
    let existing = existing_cookies(&document);
    let mut console = Scripted::new(&[]);
    let mut sink = ConfigFileSink::new(path.clone(), document);
    let outcome = run_remediation(
        &mut RemediationMachine::new(),
        existing,
        &mut console,
        &validator(&server).await,
        &mut sink,
    )
    .await
    .unwrap();

    assert_eq!(outcome, RemediationOutcome::AlreadyConfigured);
    assert!(console.questions.is_empty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
}

#[tokio::test]
async fn test_rejected_then_retried() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.ini");

    let mut console = Scripted::new(&[
        "", "", "", "", "expiredsession1", // first attempt, rejected
        "y", // retry
        "", "", "", "", "goodsession123",
    ]);
    let mut sink = ConfigFileSink::new(path.clone(), ConfigDocument::new());
    let outcome = run_remediation(
        &mut RemediationMachine::new(),
        None,
        &mut console,
        &validator(&server).await,
        &mut sink,
    )
    .await
    .unwrap();

    assert!(outcome.is_success());
    assert!(console.notices.contains(&Notice::Troubleshooting));
    assert!(path.exists());
}

#[tokio::test]
async fn test_declined_retry_writes_nothing() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.ini");

    let mut console = Scripted::new(&["", "", "", "", "expiredsession1", "n"]);
    let mut sink = ConfigFileSink::new(path.clone(), ConfigDocument::new());
    let outcome = run_remediation(
        &mut RemediationMachine::new(),
        None,
        &mut console,
        &validator(&server).await,
        &mut sink,
    )
    .await
    .unwrap();

    assert_eq!(outcome, RemediationOutcome::Abandoned);
    assert!(!path.exists());
    assert_eq!(console.notices.last(), Some(&Notice::HelpPointers));
}
