//! Drives a [`RemediationMachine`] through injected ports.

use std::time::Duration;

use async_trait::async_trait;

use super::{
    Input, Notice, Question, RemediationMachine, RemediationOutcome, Request, StepError, Verdict,
};
use crate::harness::{probe_target, DEFAULT_TIMEOUT};
use crate::probe::ProbeClient;
use crate::targets::TestTarget;
use crate::types::{CookieEntry, PersistError};

/// A human's reply to a [`Question`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Answer(String),
    /// Ctrl-C, or input closed.
    Interrupted,
}

/// Where notices go and answers come from. Blocks until the human replies.
pub trait Console {
    fn show(&mut self, notice: &Notice);
    fn ask(&mut self, question: &Question) -> Reply;
}

/// The validation gate.
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, cookies: &[CookieEntry]) -> Verdict;
}

/// Stable storage for validated cookies.
pub trait CookieSink {
    /// Persist `cookies` under `domain`; returns where they were written.
    fn persist(&mut self, domain: &str, cookies: &[CookieEntry]) -> Result<String, PersistError>;
}

/// Validates by probing a [`TestTarget`] once.
pub struct TargetValidator<C: ProbeClient> {
    client: C,
    target: TestTarget,
    timeout: Duration,
}

impl<C: ProbeClient> TargetValidator<C> {
    pub fn new(client: C, target: TestTarget) -> Self {
        Self {
            client,
            target,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl<C: ProbeClient> Validator for TargetValidator<C> {
    async fn validate(&self, cookies: &[CookieEntry]) -> Verdict {
        let result = probe_target(&self.client, &self.target, cookies, self.timeout).await;
        Verdict::from_result(&result)
    }
}

/// Run `machine` from `Idle` to a terminal state.
pub async fn run_remediation<K, V, S>(
    machine: &mut RemediationMachine,
    existing: Option<(String, Vec<CookieEntry>)>,
    console: &mut K,
    validator: &V,
    sink: &mut S,
) -> Result<RemediationOutcome, StepError>
where
    K: Console + ?Sized,
    V: Validator + ?Sized,
    S: CookieSink + ?Sized,
{
    let mut input = Input::Start { existing };
    loop {
        let transition = machine.step(input)?;
        for notice in &transition.notices {
            console.show(notice);
        }

        input = match transition.request {
            None => {
                return machine
                    .outcome()
                    .ok_or_else(|| StepError::Stalled(machine.state().name()));
            }
            Some(Request::Ask(question)) => match console.ask(&question) {
                Reply::Answer(answer) => Input::Answer(answer),
                Reply::Interrupted => Input::Interrupted,
            },
            Some(Request::Probe(cookies)) => Input::Probed(validator.validate(&cookies).await),
            Some(Request::Persist { domain, cookies }) => {
                let persisted = sink.persist(&domain, &cookies).map_err(|e| {
                    tracing::warn!("Failed to persist cookies for {domain}: {e}");
                    e.to_string()
                });
                Input::Persisted(persisted)
            }
        };
    }
}
