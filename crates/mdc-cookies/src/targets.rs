//! Fixed registry of probe targets.

use serde::Serialize;

use crate::types::CookieEntry;

/// Substrings that mark a challenge page or a bot block.
pub const BLOCK_INDICATORS: &[&str] = &[
    "cloudflare",
    "just a moment",
    "access denied",
    "forbidden",
    "ray id",
];

/// A domain's probe URL plus the indicator lists used to classify the reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestTarget {
    pub domain: String,
    pub probe_url: String,
    pub success_indicators: Vec<String>,
    pub block_indicators: Vec<String>,
}

impl TestTarget {
    pub fn new(domain: &str, probe_url: &str, success: &[&str], block: &[&str]) -> Self {
        Self {
            domain: domain.to_string(),
            probe_url: probe_url.to_string(),
            success_indicators: success.iter().map(|s| s.to_lowercase()).collect(),
            block_indicators: block.iter().map(|s| s.to_lowercase()).collect(),
        }
    }
}

/// Lookup table from domain to [`TestTarget`].
#[derive(Debug, Clone)]
pub struct TargetRegistry {
    targets: Vec<TestTarget>,
}

impl TargetRegistry {
    /// The built-in scraper targets.
    pub fn builtin() -> Self {
        fn target(domain: &str, url: &str, success: &[&str]) -> TestTarget {
            TestTarget::new(domain, url, success, BLOCK_INDICATORS)
        }

        Self {
            targets: vec![
                target(
                    "javdb.com",
                    "https://javdb.com/search?q=SSIS-001",
                    &["search-result", "movie-list", "video-detail"],
                ),
                target(
                    "www.javbus.com",
                    "https://www.javbus.com/SSIS-001",
                    &["movie", "info", "star"],
                ),
                target(
                    "javlibrary.com",
                    "https://www.javlibrary.com/en/?v=javlissis001",
                    &["video_id", "video_title", "video_info"],
                ),
                target(
                    "avmoo.com",
                    "https://avmoo.com/en/search/SSIS-001",
                    &["movie", "info"],
                ),
                target(
                    "mgstage.com",
                    "https://www.mgstage.com/search/cSearch.php?search_word=SIRO-123",
                    &["product_detail", "search_result"],
                ),
            ],
        }
    }

    /// A registry with caller-supplied targets.
    pub fn with_targets(targets: Vec<TestTarget>) -> Self {
        Self { targets }
    }

    pub fn get(&self, domain: &str) -> Option<&TestTarget> {
        self.targets.iter().find(|t| t.domain == domain)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TestTarget> {
        self.targets.iter()
    }
}

impl Default for TargetRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Domain the interactive initializer writes cookies under.
pub const BOOTSTRAP_DOMAIN: &str = "www.javbus.com";

/// Config keys that count as existing bootstrap cookies, in lookup order.
pub const BOOTSTRAP_ALIASES: &[&str] = &["www.javbus.com", "javbus.com", "javbus"];

/// Shortest session value accepted without an explicit confirmation.
pub const MIN_SESSION_LEN: usize = 10;

/// One of the three cookies the initializer collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapField {
    pub name: &'static str,
    /// `None` for the required field.
    pub default: Option<&'static str>,
}

/// The age-gate cookie, usually `1`.
pub const DV: BootstrapField = BootstrapField {
    name: "dv",
    default: Some("1"),
};

/// The magnet filter cookie, usually `mag`.
pub const EXISTMAG: BootstrapField = BootstrapField {
    name: "existmag",
    default: Some("mag"),
};

/// The session identifier. Required.
pub const PHPSESSID: BootstrapField = BootstrapField {
    name: "PHPSESSID",
    default: None,
};

/// Probe target used by the initializer's validation gate.
pub fn bootstrap_target() -> TestTarget {
    TestTarget::new(
        BOOTSTRAP_DOMAIN,
        "https://www.javbus.com/SSIS-001",
        &["movie", "info", "star", "genre"],
        &["cloudflare", "just a moment", "access denied", "forbidden"],
    )
}

/// Cookie set in persisted field order.
pub fn bootstrap_cookies(dv: &str, existmag: &str, session: &str) -> Vec<CookieEntry> {
    vec![
        CookieEntry::new(DV.name, dv),
        CookieEntry::new(EXISTMAG.name, existmag),
        CookieEntry::new(PHPSESSID.name, session),
    ]
}
