//! CLI handler for `mdc-cookies init`.

use std::path::PathBuf;

use anyhow::{Context, Result};

use mdc_cookies::remediation::{run_remediation, TargetValidator};
use mdc_cookies::targets::{bootstrap_target, BOOTSTRAP_ALIASES};
use mdc_cookies::{ConfigDocument, CookieEntry, RemediationMachine, RemediationOutcome};

use crate::cli::output;
use crate::config::{read_document, ConfigFileSink, ConfigLocator};
use crate::console::{Stream, TerminalConsole};
use crate::http::{HttpProbeClient, ProbeClientConfig};

/// Walk the user through extracting and validating bootstrap cookies.
/// Returns whether the config ended up working.
pub async fn run() -> Result<bool> {
    let locator = ConfigLocator::standard();

    if !output::is_json() {
        println!("\n{}\n", output::heading("MovieMeta Configuration Initializer"));
        println!("Checking current configuration...");
    }
    let (path, document) = open_config(&locator)?;

    let existing = existing_cookies(&document);
    let client = HttpProbeClient::new(&ProbeClientConfig::default())?;
    let validator = TargetValidator::new(client, bootstrap_target());
    let mut console = TerminalConsole::new(Stream::for_json(output::is_json()))?;
    let mut sink = ConfigFileSink::new(path.clone(), document);

    let outcome = run_remediation(
        &mut RemediationMachine::new(),
        existing,
        &mut console,
        &validator,
        &mut sink,
    )
    .await?;
    tracing::info!("Initializer finished: {outcome:?}");

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "config_path": path.display().to_string(),
            "outcome": outcome_name(&outcome),
            "success": outcome.is_success(),
        }));
    }
    Ok(outcome.is_success())
}

/// The config to update, or a fresh document at the default location.
fn open_config(locator: &ConfigLocator) -> Result<(PathBuf, ConfigDocument)> {
    match locator.resolve() {
        Some(path) => {
            let document = read_document(&path)
                .with_context(|| format!("refusing to overwrite unreadable {}", path.display()))?;
            if !output::is_json() {
                println!("[OK] Found existing config: {}\n", path.display());
            }
            Ok((path, document))
        }
        None => {
            let path = locator.create_at().to_path_buf();
            if !output::is_json() {
                println!("[!!] No config found in standard locations");
                println!("     Will create: {}\n", path.display());
            }
            Ok((path, ConfigDocument::new()))
        }
    }
}

/// Bootstrap cookies already present under any accepted alias.
pub fn existing_cookies(document: &ConfigDocument) -> Option<(String, Vec<CookieEntry>)> {
    let store = document.cookie_store().ok()?;
    store
        .find_any(BOOTSTRAP_ALIASES)
        .map(|(domain, cookies)| (domain.to_string(), cookies.to_vec()))
}

fn outcome_name(outcome: &RemediationOutcome) -> &'static str {
    match outcome {
        RemediationOutcome::AlreadyConfigured => "already_configured",
        RemediationOutcome::Configured { .. } => "configured",
        RemediationOutcome::Abandoned => "abandoned",
        RemediationOutcome::Failed => "failed",
    }
}
