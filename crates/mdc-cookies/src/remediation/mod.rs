//! Interactive cookie remediation as an explicit state machine.
//!
//! The machine never blocks or touches I/O. Each [`RemediationMachine::step`]
//! takes one [`Input`] and returns the notices to show plus at most one
//! [`Request`] whose answer becomes the next input. The driver in
//! [`driver`] walks requests through injected ports.
//!
//! ```text
//! Idle → CheckExisting → GuideExtraction → CollectInput → Validate
//!          │                    ▲                            │
//!          └→ Success           └──── retry ── Troubleshoot ←┘
//!                                                  └ decline → Abandoned
//! Validate ─ ok → Persisting → Success | Failed
//! ```

pub mod driver;

use crate::targets::{
    bootstrap_cookies, bootstrap_target, BootstrapField, TestTarget, BOOTSTRAP_DOMAIN, DV,
    EXISTMAG, MIN_SESSION_LEN, PHPSESSID,
};
use crate::types::{CookieEntry, Outcome, ProbeResult};

pub use driver::{run_remediation, Console, CookieSink, Reply, TargetValidator, Validator};

/// Guides pointed to when the user declines another attempt.
pub const HELP_DOCS: &[&str] = &["QUICK-COOKIE-FIX.md", "CLOUDFLARE-BYPASS-GUIDE.md"];

/// Walkthrough pages shown before collecting values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideStage {
    /// Open the site and pass the age gate.
    OpenSite,
    /// Open DevTools and find the cookie table.
    LocateCookies,
}

/// Something the human must answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Question {
    /// Press ENTER once the guide stage is done.
    Continue(GuideStage),
    /// Enter a cookie value; blank takes the field default if it has one.
    CookieValue(BootstrapField),
    /// Keep a session value shorter than the soft minimum? (y/N)
    ConfirmShortSession { length: usize },
    /// Try the extraction again? (y/N)
    RetryConsent,
}

/// Something to tell the human. Rendering is up to the console.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    ExistingFound { domain: String, names: Vec<String> },
    NoExistingCookies,
    Guide(GuideStage),
    EnterValues,
    SessionRequired,
    SessionTooShort { length: usize },
    Validating { url: String, names: Vec<String> },
    ValidationPassed,
    ValidationFailed { outcome: Outcome, reason: String },
    AlreadyConfigured,
    ExistingExpired,
    Troubleshooting,
    Configured { location: String },
    PersistFailed { message: String },
    Cancelled,
    /// Where to read more after giving up; see [`HELP_DOCS`].
    HelpPointers,
    Interrupted,
}

/// Work the driver must do before the next step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Ask(Question),
    Probe(Vec<CookieEntry>),
    Persist {
        domain: String,
        cookies: Vec<CookieEntry>,
    },
}

/// Pass/fail result of the validation gate.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub validated: bool,
    pub outcome: Outcome,
    pub reason: String,
}

impl Verdict {
    /// Only `Success` counts as validated; every other outcome folds to a failure.
    pub fn from_result(result: &ProbeResult) -> Self {
        Self {
            validated: result.outcome == Outcome::Success,
            outcome: result.outcome,
            reason: result.reason.clone(),
        }
    }
}

/// Structured input to a step.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Begin the run with whatever bootstrap cookies are already configured.
    Start {
        existing: Option<(String, Vec<CookieEntry>)>,
    },
    Answer(String),
    Probed(Verdict),
    /// Where the config was written, or why it could not be.
    Persisted(Result<String, String>),
    /// Ctrl-C or end of input.
    Interrupted,
}

/// Progress through the three collected values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collect {
    Dv,
    Existmag {
        dv: String,
    },
    Session {
        dv: String,
        existmag: String,
    },
    ConfirmShort {
        dv: String,
        existmag: String,
        session: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    Idle,
    CheckExisting,
    GuideExtraction(GuideStage),
    CollectInput(Collect),
    Validate { cookies: Vec<CookieEntry> },
    Troubleshoot,
    Persisting { cookies: Vec<CookieEntry> },
    Success { location: Option<String> },
    Abandoned,
    Failed,
}

impl State {
    pub fn name(&self) -> &'static str {
        match self {
            State::Idle => "idle",
            State::CheckExisting => "check_existing",
            State::GuideExtraction(_) => "guide_extraction",
            State::CollectInput(_) => "collect_input",
            State::Validate { .. } => "validate",
            State::Troubleshoot => "troubleshoot",
            State::Persisting { .. } => "persisting",
            State::Success { .. } => "success",
            State::Abandoned => "abandoned",
            State::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Success { .. } | State::Abandoned | State::Failed)
    }
}

/// How a remediation run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemediationOutcome {
    /// Existing cookies already validate; nothing was written.
    AlreadyConfigured,
    /// Fresh cookies validated and were written to `location`.
    Configured { location: String },
    Abandoned,
    Failed,
}

impl RemediationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            RemediationOutcome::AlreadyConfigured | RemediationOutcome::Configured { .. }
        )
    }
}

/// Result of one step.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub notices: Vec<Notice>,
    /// `None` once the machine is terminal.
    pub request: Option<Request>,
}

impl Transition {
    fn ask(notices: Vec<Notice>, question: Question) -> Self {
        Self {
            notices,
            request: Some(Request::Ask(question)),
        }
    }

    fn done(notices: Vec<Notice>) -> Self {
        Self {
            notices,
            request: None,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    #[error("input {input} is not valid in state {state}")]
    UnexpectedInput {
        state: &'static str,
        input: &'static str,
    },

    #[error("machine stopped in non-terminal state {0}")]
    Stalled(&'static str),
}

/// The remediation loop for the bootstrap domain.
#[derive(Debug, Clone)]
pub struct RemediationMachine {
    state: State,
    target: TestTarget,
}

impl RemediationMachine {
    /// A machine validating against the built-in bootstrap target.
    pub fn new() -> Self {
        Self::with_target(bootstrap_target())
    }

    pub fn with_target(target: TestTarget) -> Self {
        Self {
            state: State::Idle,
            target,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn target(&self) -> &TestTarget {
        &self.target
    }

    /// Final outcome, once terminal.
    pub fn outcome(&self) -> Option<RemediationOutcome> {
        match &self.state {
            State::Success { location: None } => Some(RemediationOutcome::AlreadyConfigured),
            State::Success {
                location: Some(location),
            } => Some(RemediationOutcome::Configured {
                location: location.clone(),
            }),
            State::Abandoned => Some(RemediationOutcome::Abandoned),
            State::Failed => Some(RemediationOutcome::Failed),
            _ => None,
        }
    }

    /// Advance by one input.
    pub fn step(&mut self, input: Input) -> Result<Transition, StepError> {
        let state = std::mem::replace(&mut self.state, State::Idle);
        let from = state.name();
        let (next, transition) = match self.transition(state, input) {
            Ok(pair) => pair,
            Err((state, err)) => {
                self.state = state;
                return Err(err);
            }
        };
        tracing::debug!("Remediation {} → {}", from, next.name());
        self.state = next;
        Ok(transition)
    }

    #[allow(clippy::result_large_err)]
    fn transition(
        &self,
        state: State,
        input: Input,
    ) -> Result<(State, Transition), (State, StepError)> {
        if matches!(input, Input::Interrupted) && !state.is_terminal() {
            return Ok((
                State::Abandoned,
                Transition::done(vec![Notice::Interrupted]),
            ));
        }

        let pair = match (state, input) {
            (State::Idle, Input::Start { existing }) => match existing {
                Some((domain, cookies)) => {
                    let notices = vec![
                        Notice::ExistingFound {
                            domain,
                            names: names(&cookies),
                        },
                        self.validating(&cookies),
                    ];
                    (
                        State::CheckExisting,
                        Transition {
                            notices,
                            request: Some(Request::Probe(cookies)),
                        },
                    )
                }
                None => self.guide(vec![Notice::NoExistingCookies]),
            },

            (State::CheckExisting, Input::Probed(verdict)) => {
                if verdict.validated {
                    (
                        State::Success { location: None },
                        Transition::done(vec![Notice::ValidationPassed, Notice::AlreadyConfigured]),
                    )
                } else {
                    self.guide(vec![
                        Notice::ValidationFailed {
                            outcome: verdict.outcome,
                            reason: verdict.reason,
                        },
                        Notice::ExistingExpired,
                    ])
                }
            }

            (State::GuideExtraction(GuideStage::OpenSite), Input::Answer(_)) => (
                State::GuideExtraction(GuideStage::LocateCookies),
                Transition::ask(
                    vec![Notice::Guide(GuideStage::LocateCookies)],
                    Question::Continue(GuideStage::LocateCookies),
                ),
            ),

            (State::GuideExtraction(GuideStage::LocateCookies), Input::Answer(_)) => (
                State::CollectInput(Collect::Dv),
                Transition::ask(vec![Notice::EnterValues], Question::CookieValue(DV)),
            ),

            (State::CollectInput(collect), Input::Answer(answer)) => {
                self.collect(collect, answer.trim())
            }

            (State::Validate { cookies }, Input::Probed(verdict)) => {
                if verdict.validated {
                    (
                        State::Persisting {
                            cookies: cookies.clone(),
                        },
                        Transition {
                            notices: vec![Notice::ValidationPassed],
                            request: Some(Request::Persist {
                                domain: BOOTSTRAP_DOMAIN.to_string(),
                                cookies,
                            }),
                        },
                    )
                } else {
                    (
                        State::Troubleshoot,
                        Transition::ask(
                            vec![
                                Notice::ValidationFailed {
                                    outcome: verdict.outcome,
                                    reason: verdict.reason,
                                },
                                Notice::Troubleshooting,
                            ],
                            Question::RetryConsent,
                        ),
                    )
                }
            }

            (State::Troubleshoot, Input::Answer(answer)) => {
                if is_yes(&answer) {
                    self.guide(Vec::new())
                } else {
                    (
                        State::Abandoned,
                        Transition::done(vec![Notice::Cancelled, Notice::HelpPointers]),
                    )
                }
            }

            (State::Persisting { .. }, Input::Persisted(Ok(location))) => (
                State::Success {
                    location: Some(location.clone()),
                },
                Transition::done(vec![Notice::Configured { location }]),
            ),

            (State::Persisting { .. }, Input::Persisted(Err(message))) => (
                State::Failed,
                Transition::done(vec![Notice::PersistFailed { message }]),
            ),

            (state, input) => {
                let err = StepError::UnexpectedInput {
                    state: state.name(),
                    input: input_name(&input),
                };
                return Err((state, err));
            }
        };
        Ok(pair)
    }

    fn collect(&self, collect: Collect, answer: &str) -> (State, Transition) {
        match collect {
            Collect::Dv => (
                State::CollectInput(Collect::Existmag {
                    dv: or_default(answer, DV),
                }),
                Transition::ask(Vec::new(), Question::CookieValue(EXISTMAG)),
            ),
            Collect::Existmag { dv } => (
                State::CollectInput(Collect::Session {
                    dv,
                    existmag: or_default(answer, EXISTMAG),
                }),
                Transition::ask(Vec::new(), Question::CookieValue(PHPSESSID)),
            ),
            Collect::Session { dv, existmag } => {
                let length = answer.chars().count();
                if length == 0 {
                    (
                        State::CollectInput(Collect::Session { dv, existmag }),
                        Transition::ask(
                            vec![Notice::SessionRequired],
                            Question::CookieValue(PHPSESSID),
                        ),
                    )
                } else if length < MIN_SESSION_LEN {
                    (
                        State::CollectInput(Collect::ConfirmShort {
                            dv,
                            existmag,
                            session: answer.to_string(),
                        }),
                        Transition::ask(
                            vec![Notice::SessionTooShort { length }],
                            Question::ConfirmShortSession { length },
                        ),
                    )
                } else {
                    self.validate(bootstrap_cookies(&dv, &existmag, answer))
                }
            }
            Collect::ConfirmShort {
                dv,
                existmag,
                session,
            } => {
                if is_yes(answer) {
                    self.validate(bootstrap_cookies(&dv, &existmag, &session))
                } else {
                    (
                        State::CollectInput(Collect::Session { dv, existmag }),
                        Transition::ask(Vec::new(), Question::CookieValue(PHPSESSID)),
                    )
                }
            }
        }
    }

    fn guide(&self, mut notices: Vec<Notice>) -> (State, Transition) {
        notices.push(Notice::Guide(GuideStage::OpenSite));
        (
            State::GuideExtraction(GuideStage::OpenSite),
            Transition::ask(notices, Question::Continue(GuideStage::OpenSite)),
        )
    }

    fn validate(&self, cookies: Vec<CookieEntry>) -> (State, Transition) {
        let notices = vec![self.validating(&cookies)];
        (
            State::Validate {
                cookies: cookies.clone(),
            },
            Transition {
                notices,
                request: Some(Request::Probe(cookies)),
            },
        )
    }

    fn validating(&self, cookies: &[CookieEntry]) -> Notice {
        Notice::Validating {
            url: self.target.probe_url.clone(),
            names: names(cookies),
        }
    }
}

impl Default for RemediationMachine {
    fn default() -> Self {
        Self::new()
    }
}

fn names(cookies: &[CookieEntry]) -> Vec<String> {
    cookies.iter().map(|c| c.name.clone()).collect()
}

fn or_default(answer: &str, field: BootstrapField) -> String {
    match (answer.is_empty(), field.default) {
        (true, Some(default)) => default.to_string(),
        _ => answer.to_string(),
    }
}

fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}

fn input_name(input: &Input) -> &'static str {
    match input {
        Input::Start { .. } => "start",
        Input::Answer(_) => "answer",
        Input::Probed(_) => "probed",
        Input::Persisted(_) => "persisted",
        Input::Interrupted => "interrupted",
    }
}
