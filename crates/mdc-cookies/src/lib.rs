//! mdc-cookies: validation and remediation of scraper authentication cookies.
//!
//! Parses the `[cookies]` config section, probes each target domain with its
//! cookies, classifies the replies, aggregates a report, and drives the
//! interactive extract → validate → troubleshoot loop.

pub mod classify;
pub mod config;
pub mod harness;
pub mod probe;
pub mod remediation;
pub mod report;
pub mod store;
pub mod targets;
pub mod types;

pub use classify::{classify, classify_failure, classify_response};
pub use config::ConfigDocument;
pub use harness::{probe_target, DomainTestHarness, DEFAULT_THROTTLE, DEFAULT_TIMEOUT};
pub use probe::{ProbeClient, ProbeMethod, ProbeRequest, ProbeResponse};
pub use remediation::{RemediationMachine, RemediationOutcome};
pub use report::{aggregate, Recommendation, Summary};
pub use store::CookieStore;
pub use targets::{TargetRegistry, TestTarget};
pub use types::*;
