//! Core data types for cookie probes and their outcomes.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A single `name=value` cookie pair as it appears in the config file.
///
/// Values are opaque tokens; names are case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CookieEntry {
    pub name: String,
    pub value: String,
}

impl CookieEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for CookieEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Classification of a single probe. Exactly one per [`ProbeResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Blocked,
    Forbidden,
    NotFound,
    Warning,
    Timeout,
    SslError,
    NetworkError,
    Skipped,
}

impl Outcome {
    /// Every outcome, in report display order.
    pub const ALL: [Outcome; 9] = [
        Outcome::Success,
        Outcome::Forbidden,
        Outcome::Blocked,
        Outcome::Timeout,
        Outcome::Warning,
        Outcome::NotFound,
        Outcome::SslError,
        Outcome::NetworkError,
        Outcome::Skipped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Blocked => "blocked",
            Outcome::Forbidden => "forbidden",
            Outcome::NotFound => "not_found",
            Outcome::Warning => "warning",
            Outcome::Timeout => "timeout",
            Outcome::SslError => "ssl_error",
            Outcome::NetworkError => "network_error",
            Outcome::Skipped => "skipped",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome plus the human-readable reason attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub outcome: Outcome,
    pub reason: String,
}

impl Classification {
    pub fn new(outcome: Outcome, reason: impl Into<String>) -> Self {
        Self {
            outcome,
            reason: reason.into(),
        }
    }
}

/// Result of one probe attempt against one domain. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub domain: String,
    pub outcome: Outcome,
    pub http_status: Option<u16>,
    pub elapsed_seconds: Option<f64>,
    pub content_length: Option<usize>,
    pub reason: String,
}

impl ProbeResult {
    /// A probe that never reached the network.
    pub fn skipped(domain: &str, reason: &str) -> Self {
        Self {
            domain: domain.to_string(),
            outcome: Outcome::Skipped,
            http_status: None,
            elapsed_seconds: None,
            content_length: None,
            reason: reason.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Transport-level failure raised before any status code exists.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out after {} seconds", .after.as_secs())]
    Timeout { after: Duration },

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("{0}")]
    Other(String),
}

/// Errors raised while locating or reading the cookie configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("no config file found in standard locations:\n{}", format_candidates(.searched))]
    NotFound { searched: Vec<String> },

    #[error("config file not found: {0}")]
    Missing(String),

    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("no [cookies] section found in config")]
    MissingCookieSection,
}

fn format_candidates(paths: &[String]) -> String {
    paths
        .iter()
        .map(|p| format!("  - {p}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Errors raised while writing validated cookies back to disk.
#[derive(thiserror::Error, Debug)]
pub enum PersistError {
    #[error("failed to write config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to update config: {0}")]
    Config(#[from] ConfigError),
}

/// Convenience result type for config handling.
pub type CookieResult<T> = Result<T, ConfigError>;
