//! INI config document holding the `[cookies]` section.
//!
//! Only the text is handled here; locating and writing the file on disk
//! belongs to the caller.

use configparser::ini::{Ini, IniDefault};

use crate::store::{self, CookieStore};
use crate::types::{ConfigError, CookieEntry, CookieResult};

/// Name of the section holding domain cookie strings.
pub const COOKIE_SECTION: &str = "cookies";

/// Comment block written at the top of every persisted config.
pub const CONFIG_HEADER: &str = "\
# MovieMeta Configuration File
#
# This file can be placed in one of the following locations:
#  1. ./config.ini (current directory)
#  2. ~/mdc.ini
#  3. ~/.mdc.ini
#  4. ~/.mdc/config.ini
#  5. ~/.config/mdc/config.ini
#
# The first file found will be used.
";

/// A parsed config file. Keeps every section so a rewrite preserves them.
pub struct ConfigDocument {
    ini: Ini,
}

/// Case-sensitive keys; `#` and `;` only start comments at line start, so
/// cookie values may contain them.
fn new_ini() -> Ini {
    let mut defaults = IniDefault::default();
    defaults.case_sensitive = true;
    defaults.enable_inline_comments = false;
    Ini::new_from_defaults(defaults)
}

impl ConfigDocument {
    /// An empty document with no sections.
    pub fn new() -> Self {
        Self { ini: new_ini() }
    }

    /// Parse INI text.
    pub fn parse(text: &str) -> CookieResult<Self> {
        let mut ini = new_ini();
        ini.read(text.to_string()).map_err(ConfigError::Parse)?;
        Ok(Self { ini })
    }

    /// Raw `domain -> cookie string` pairs in file order.
    ///
    /// Fails when the document has no `[cookies]` section at all; a present
    /// but empty section is valid.
    pub fn cookie_section(&self) -> CookieResult<Vec<(String, String)>> {
        let section = self
            .ini
            .get_map_ref()
            .get(COOKIE_SECTION)
            .ok_or(ConfigError::MissingCookieSection)?;

        Ok(section
            .iter()
            .map(|(domain, value)| (domain.clone(), value.clone().unwrap_or_default()))
            .collect())
    }

    /// Load the cookie store from the `[cookies]` section.
    pub fn cookie_store(&self) -> CookieResult<CookieStore> {
        Ok(CookieStore::load(self.cookie_section()?))
    }

    /// Write `entries` under `domain` in the `[cookies]` section, creating
    /// the section if needed.
    pub fn set_cookies(&mut self, domain: &str, entries: &[CookieEntry]) {
        self.ini
            .set(COOKIE_SECTION, domain, Some(store::serialize(entries)));
    }

    /// Render the persisted form: fixed header, blank line, then sections.
    pub fn render(&self) -> String {
        format!("{CONFIG_HEADER}\n{}", self.ini.writes())
    }
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self::new()
    }
}
