//! CLI handler for `mdc-cookies test [CONFIG]`.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use mdc_cookies::report::{aggregate, Recommendation, Summary};
use mdc_cookies::{DomainTestHarness, Outcome, ProbeResult, TargetRegistry};

use crate::cli::output;
use crate::config::{read_document, ConfigLocator};
use crate::http::{HttpProbeClient, ProbeClientConfig};

/// Options for one batch run.
#[derive(Debug, Clone)]
pub struct TestOptions {
    pub config: Option<PathBuf>,
    pub timeout: Duration,
    pub delay: Duration,
    pub proxy: Option<String>,
    pub insecure: bool,
}

/// Probe every configured domain. Returns whether at least one validated.
pub async fn run(opts: &TestOptions) -> Result<bool> {
    let locator = ConfigLocator::standard();
    let path = locator.resolve_explicit(opts.config.as_deref())?;
    let document =
        read_document(&path).with_context(|| format!("failed to load {}", path.display()))?;
    let store = document.cookie_store()?;

    let json = output::is_json();
    if !json {
        println!("{}\n", output::heading("Cookie Test"));
        println!("Config: {}", path.display());
        println!("Loaded cookies for {} domain(s):", store.len());
        for domain in store.domains() {
            println!("  - {domain}");
        }
        println!();
    }

    let client = HttpProbeClient::new(&ProbeClientConfig {
        proxy: opts.proxy.clone(),
        verify_tls: !opts.insecure,
        ..ProbeClientConfig::default()
    })?;
    let registry = TargetRegistry::builtin();
    let harness = DomainTestHarness::new(&client, &store, &registry).with_timeout(opts.timeout);

    let results = harness
        .test_all_with(opts.delay, |result| {
            if !json {
                println!("{}", progress_line(result));
            }
        })
        .await;
    let summary = aggregate(&results);

    if json {
        let report = TestReport::new(&path, &results, &summary, Utc::now());
        output::print_json(&serde_json::to_value(&report)?);
    } else {
        println!();
        print!("{}", render_summary(&summary));
    }

    Ok(summary.is_operational())
}

/// One line per finished probe.
pub fn progress_line(result: &ProbeResult) -> String {
    let mut line = format!(
        "{} {:<24} {:<14}",
        output::marker(result.is_success()),
        result.domain,
        result.outcome.as_str()
    );
    if let Some(status) = result.http_status {
        let _ = write!(line, " HTTP {status}");
    }
    if let Some(secs) = result.elapsed_seconds {
        let _ = write!(line, " {secs:.2}s");
    }
    if let Some(len) = result.content_length {
        let _ = write!(line, " {len} chars");
    }
    if !result.reason.is_empty() {
        let _ = write!(line, "  {}", result.reason);
    }
    line
}

fn group_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Success => "Successfully authenticated",
        Outcome::Forbidden => "Cookies rejected (403 Forbidden)",
        Outcome::Blocked => "Cloudflare or bot protection detected",
        Outcome::Timeout => "Connection timeouts",
        Outcome::Warning => "Loaded with unexpected content",
        Outcome::NotFound => "Test page not found (404)",
        Outcome::SslError => "TLS errors",
        Outcome::NetworkError => "Network errors",
        Outcome::Skipped => "Skipped",
    }
}

fn group_hint(outcome: Outcome) -> Option<&'static str> {
    match outcome {
        Outcome::Success | Outcome::Skipped => None,
        Outcome::Forbidden => Some("Re-extract cookies from your browser (they may have expired)"),
        Outcome::Blocked => Some("Extract fresh cookies after passing the challenge in a browser"),
        Outcome::Timeout => Some("Check your internet connection or try again later"),
        Outcome::Warning => Some("The page layout may have changed; check the site manually"),
        Outcome::NotFound => Some("The test page may have moved"),
        Outcome::SslError => Some("Check the system clock and any intercepting proxy"),
        Outcome::NetworkError => Some("Check DNS, proxy settings, and that the site is up"),
    }
}

/// Grouped summary and recommendation, as printed in text mode.
pub fn render_summary(summary: &Summary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}\n", output::heading("Summary"));
    let _ = writeln!(
        out,
        "Working: {}/{}\n",
        summary.success_count, summary.total_count
    );

    for outcome in Outcome::ALL {
        let domains = summary.domains_with(outcome);
        if domains.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{} {}:", output::marker(outcome.is_success()), group_label(outcome));
        for domain in domains {
            let _ = writeln!(out, "   - {domain}");
        }
        if let Some(hint) = group_hint(outcome) {
            let _ = writeln!(out, "   Hint: {hint}");
        }
        out.push('\n');
    }

    let _ = writeln!(out, "{}\n", output::heading("Recommendation"));
    let _ = writeln!(out, "{}", summary.recommendation.headline());
    match summary.recommendation {
        Recommendation::ReextractAll => {
            out.push_str(
                "\nNext steps:\n\
                 1. Extract fresh cookies from your browser\n\
                 2. Update the [cookies] section of your config\n\
                 3. Run `mdc-cookies test` again\n",
            );
        }
        Recommendation::ReextractFailing => {
            let _ = writeln!(out, "\nNeeds attention:");
            for domain in summary.failing_domains() {
                let _ = writeln!(out, "   - {domain}");
            }
        }
        Recommendation::FullyOperational => {}
    }
    out
}

/// The `--json` document.
#[derive(Debug, Serialize)]
pub struct TestReport<'a> {
    pub config_path: String,
    pub generated_at: DateTime<Utc>,
    pub results: &'a [ProbeResult],
    pub summary: &'a Summary,
}

impl<'a> TestReport<'a> {
    pub fn new(
        path: &Path,
        results: &'a [ProbeResult],
        summary: &'a Summary,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            config_path: path.display().to_string(),
            generated_at,
            results,
            summary,
        }
    }
}
