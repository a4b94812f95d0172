//! Per-domain probe orchestration.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;

use crate::classify::{self, classify_response};
use crate::probe::{ProbeClient, ProbeRequest};
use crate::store::CookieStore;
use crate::targets::{TargetRegistry, TestTarget};
use crate::types::{CookieEntry, ProbeResult, TransportError};

/// Timeout used by the reference flows.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Pause between consecutive probes in a batch run.
pub const DEFAULT_THROTTLE: Duration = Duration::from_secs(1);

/// Probes domains one at a time with their configured cookies.
pub struct DomainTestHarness<'a, C: ProbeClient> {
    client: C,
    store: &'a CookieStore,
    registry: &'a TargetRegistry,
    timeout: Duration,
}

impl<'a, C: ProbeClient> DomainTestHarness<'a, C> {
    pub fn new(client: C, store: &'a CookieStore, registry: &'a TargetRegistry) -> Self {
        Self {
            client,
            store,
            registry,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Probe one domain. Issues at most one request and never fails.
    pub async fn test(&self, domain: &str) -> ProbeResult {
        let Some(cookies) = self.store.get(domain) else {
            return ProbeResult::skipped(domain, "no cookies configured");
        };
        let Some(target) = self.registry.get(domain) else {
            return ProbeResult::skipped(domain, "no test target defined");
        };
        probe_target(&self.client, target, cookies, self.timeout).await
    }

    /// Probe every configured domain in sorted order, pausing `throttle`
    /// between consecutive probes.
    pub async fn test_all(&self, throttle: Duration) -> Vec<ProbeResult> {
        self.test_all_with(throttle, |_| {}).await
    }

    /// Like [`test_all`](Self::test_all), calling `on_result` after each probe.
    pub async fn test_all_with<F>(&self, throttle: Duration, mut on_result: F) -> Vec<ProbeResult>
    where
        F: FnMut(&ProbeResult),
    {
        let domains: Vec<&str> = self.store.domains().collect();
        tracing::info!("Testing {} domain(s)", domains.len());

        let mut results = Vec::with_capacity(domains.len());
        for (i, domain) in domains.iter().enumerate() {
            if i > 0 && !throttle.is_zero() {
                tokio::time::sleep(throttle).await;
            }
            let result = self.test(domain).await;
            on_result(&result);
            results.push(result);
        }
        results
    }
}

/// Send one probe against `target` and classify the reply.
pub async fn probe_target<C: ProbeClient + ?Sized>(
    client: &C,
    target: &TestTarget,
    cookies: &[CookieEntry],
    timeout: Duration,
) -> ProbeResult {
    tracing::debug!(
        "Probing {} at {} with {} cookie(s)",
        target.domain,
        target.probe_url,
        cookies.len()
    );

    let request = ProbeRequest::get(&target.probe_url, cookies, timeout);
    // A panicking client costs only this domain's result.
    let response = match AssertUnwindSafe(client.send(request)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => Err(TransportError::Other(format!(
            "client panicked: {}",
            panic_message(&*payload)
        ))),
    };
    let verdict = classify_response(&response, target);

    match response {
        Ok(resp) => {
            tracing::debug!(
                "{} answered HTTP {} in {:.1}s (server: {}) → {}",
                target.domain,
                resp.status,
                resp.elapsed.as_secs_f64(),
                resp.header("server").unwrap_or("-"),
                verdict.outcome
            );
            ProbeResult {
                domain: target.domain.clone(),
                outcome: verdict.outcome,
                http_status: Some(resp.status),
                elapsed_seconds: Some(resp.elapsed.as_secs_f64()),
                content_length: Some(resp.body.chars().count()),
                reason: verdict.reason,
            }
        }
        Err(err) => {
            tracing::warn!(
                "Probe for {} failed: {}",
                target.domain,
                classify::truncate(&err.to_string(), classify::MAX_REASON_LEN)
            );
            ProbeResult {
                domain: target.domain.clone(),
                outcome: verdict.outcome,
                http_status: None,
                elapsed_seconds: None,
                content_length: None,
                reason: verdict.reason,
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
