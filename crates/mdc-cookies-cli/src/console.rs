//! Terminal rendering of remediation notices and prompts.

use std::io::Write;

use rustyline::config::Behavior;
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor};

use mdc_cookies::remediation::{Console, GuideStage, Notice, Question, Reply, HELP_DOCS};
use mdc_cookies::targets::{BootstrapField, BOOTSTRAP_DOMAIN, MIN_SESSION_LEN};

const RULE_WIDTH: usize = 70;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn section(title: &str) -> String {
    format!("{}\n{title}\n{}\n", rule(), rule())
}

/// Text shown for a notice.
pub fn notice_text(notice: &Notice) -> String {
    match notice {
        Notice::ExistingFound { domain, names } => format!(
            "[OK] Found bootstrap cookies for: {domain}\n     Cookies: {}",
            names.join(", ")
        ),
        Notice::NoExistingCookies => "[!!] No bootstrap cookies configured".to_string(),
        Notice::Guide(GuideStage::OpenSite) => format!(
            "\nLet's set up your cookies. This takes about two minutes.\n\n{}\n\
             1. Open Chrome, Firefox, or any modern browser\n\
             2. Go to: https://{BOOTSTRAP_DOMAIN}\n\
             3. Complete the age verification (click the \"Enter\" button)\n\
             4. Wait for the page to fully load\n",
            section("Step 1: Open the site in your browser")
        ),
        Notice::Guide(GuideStage::LocateCookies) => format!(
            "\n{}\n\
             Chrome/Edge: press F12, open the 'Application' tab, expand 'Cookies'\n\
             Firefox:     press F12, open the 'Storage' tab, expand 'Cookies'\n\
             Then select 'https://{BOOTSTRAP_DOMAIN}'.\n\n\
             Look for these three cookies (all are needed):\n  \
             dv          (usually '1')\n  \
             existmag    (usually 'mag')\n  \
             PHPSESSID   (long random string like '5ti9138au9ih2d3gdirp60gdo1')\n",
            section("Step 2: Find the cookies in DevTools")
        ),
        Notice::EnterValues => format!(
            "\n{}\nFor each cookie, copy its VALUE from the DevTools table.\n",
            section("Step 3: Enter cookie values")
        ),
        Notice::SessionRequired => {
            "  [!!] PHPSESSID is required. Please enter a value.".to_string()
        }
        Notice::SessionTooShort { length } => format!(
            "\n  [!!] PHPSESSID is only {length} characters (expected at least {MIN_SESSION_LEN}). \
             Make sure you copied the complete value."
        ),
        Notice::Validating { url, names } => format!(
            "\n{}\nTesting connection...\n   URL: {url}\n   Cookies: {}",
            section("Validating cookies"),
            names.join(", ")
        ),
        Notice::ValidationPassed => "[OK] Cookies are valid and working".to_string(),
        Notice::ValidationFailed { outcome, reason } => {
            format!("[!!] Cookie validation failed: {outcome} ({reason})")
        }
        Notice::AlreadyConfigured => {
            "\n[OK] Your configuration is already working. Nothing to do.".to_string()
        }
        Notice::ExistingExpired => {
            "\n[!!] Cookies are configured but not working (they may have expired). \
             Let's refresh them."
                .to_string()
        }
        Notice::Troubleshooting => format!(
            "\n{}\n\
             1. PHPSESSID incomplete: copy the ENTIRE value, usually 20+ characters\n\
             2. Wrong domain: extract from 'https://{BOOTSTRAP_DOMAIN}' (note the 'www')\n\
             3. Age verification skipped: 'dv=1' is only set after clicking 'Enter'\n\
             4. Cookies expired mid-extraction: start over and work quickly\n",
            section("Troubleshooting")
        ),
        Notice::Configured { location } => format!(
            "\n{}\n[OK] Cookies written to {location}\n\n\
             Cookies typically last from a day to several months.\n\
             Run `mdc-cookies test` any time to check them.",
            section("Configuration complete")
        ),
        Notice::PersistFailed { message } => format!("[!!] Failed to write config: {message}"),
        Notice::Cancelled => "\nConfiguration cancelled.".to_string(),
        Notice::HelpPointers => {
            let mut text = String::from("\nFor help, see:");
            for doc in HELP_DOCS {
                text.push_str("\n  - ");
                text.push_str(doc);
            }
            text
        }
        Notice::Interrupted => "\n\nConfiguration cancelled by user.".to_string(),
    }
}

/// Lines printed before a question's prompt, if any.
pub fn question_preamble(question: &Question) -> Option<String> {
    match question {
        Question::CookieValue(field) => Some(field_preamble(field)),
        _ => None,
    }
}

fn field_preamble(field: &BootstrapField) -> String {
    let index = match field.name {
        "dv" => 1,
        "existmag" => 2,
        _ => 3,
    };
    match field.default {
        Some(default) => format!(
            "\nCookie {index}: {}\n  Default value: {default}",
            field.name
        ),
        None => format!(
            "\nCookie {index}: {}\n  A long random string, e.g. 5ti9138au9ih2d3gdirp60gdo1\n  \
             Copy the COMPLETE value",
            field.name
        ),
    }
}

/// The single-line prompt for a question.
pub fn question_prompt(question: &Question) -> String {
    match question {
        Question::Continue(GuideStage::OpenSite) => {
            "Press ENTER when you've completed age verification...".to_string()
        }
        Question::Continue(GuideStage::LocateCookies) => {
            "Press ENTER when you can see the cookies...".to_string()
        }
        Question::CookieValue(field) => match field.default {
            Some(default) => format!("  Enter {} value [{default}]: ", field.name),
            None => format!("  Enter {} value: ", field.name),
        },
        Question::ConfirmShortSession { .. } => "  Continue anyway? [y/N]: ".to_string(),
        Question::RetryConsent => "Would you like to try again? [y/N]: ".to_string(),
    }
}

/// Where console text goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    /// Keeps stdout free for a machine-readable result.
    Stderr,
}

impl Stream {
    pub fn for_json(json: bool) -> Self {
        if json {
            Stream::Stderr
        } else {
            Stream::Stdout
        }
    }

    fn write_line(self, text: &str) {
        let result = match self {
            Stream::Stdout => writeln!(std::io::stdout(), "{text}"),
            Stream::Stderr => writeln!(std::io::stderr(), "{text}"),
        };
        if let Err(e) = result {
            tracing::warn!("Failed to write to console: {e}");
        }
    }
}

/// Line-editing console on the controlling terminal.
pub struct TerminalConsole {
    editor: DefaultEditor,
    stream: Stream,
}

impl TerminalConsole {
    pub fn new(stream: Stream) -> anyhow::Result<Self> {
        let editor = match stream {
            Stream::Stdout => DefaultEditor::new()?,
            // Prompt on the terminal device rather than a redirected stdout.
            Stream::Stderr => DefaultEditor::with_config(
                Config::builder().behavior(Behavior::PreferTerm).build(),
            )?,
        };
        Ok(Self { editor, stream })
    }
}

impl Console for TerminalConsole {
    fn show(&mut self, notice: &Notice) {
        self.stream.write_line(&notice_text(notice));
    }

    fn ask(&mut self, question: &Question) -> Reply {
        if let Some(preamble) = question_preamble(question) {
            self.stream.write_line(&preamble);
        }
        match self.editor.readline(&question_prompt(question)) {
            Ok(line) => Reply::Answer(line),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Reply::Interrupted,
            Err(e) => {
                tracing::warn!("Failed to read input: {e}");
                Reply::Interrupted
            }
        }
    }
}
