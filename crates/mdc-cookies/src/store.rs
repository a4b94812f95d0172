//! Domain-keyed cookie store parsed from the `[cookies]` config section.
//!
//! Each value is a comma-separated list of `name=value` pairs:
//!
//! ```ini
//! [cookies]
//! www.javbus.com = dv=1,existmag=mag,PHPSESSID=abc123def456
//! ```

use std::collections::BTreeMap;

use crate::types::CookieEntry;

/// Parse a comma-separated cookie string into ordered entries.
///
/// Segments are trimmed and split on the first `=`; segments without `=`
/// are dropped. Empty input yields an empty list.
pub fn parse(raw: &str) -> Vec<CookieEntry> {
    raw.split(',')
        .filter_map(|segment| {
            let (name, value) = segment.trim().split_once('=')?;
            Some(CookieEntry::new(name.trim(), value.trim()))
        })
        .collect()
}

/// Serialize entries back into the persisted `name=value,name=value` form.
pub fn serialize(entries: &[CookieEntry]) -> String {
    entries
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Render entries as an HTTP `Cookie` header value.
pub fn header_value(entries: &[CookieEntry]) -> String {
    entries
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Mapping from domain to its cookie set.
///
/// Domains are matched by exact string. Iteration is in sorted domain order,
/// which is also the order batch probes run in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieStore {
    domains: BTreeMap<String, Vec<CookieEntry>>,
}

impl CookieStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from raw `domain -> cookie string` pairs.
    ///
    /// Domains whose string parses to nothing are left out entirely.
    pub fn load<I, K, V>(section: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut store = Self::new();
        for (domain, raw) in section {
            let entries = parse(raw.as_ref());
            if entries.is_empty() {
                tracing::debug!("No usable cookies for {}", domain.as_ref());
                continue;
            }
            store.domains.insert(domain.as_ref().to_string(), entries);
        }
        store
    }

    /// Cookies configured for `domain`, if any.
    pub fn get(&self, domain: &str) -> Option<&[CookieEntry]> {
        self.domains.get(domain).map(Vec::as_slice)
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.domains.contains_key(domain)
    }

    /// Configured domains in sorted order.
    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.domains.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// First of `aliases` that has cookies configured.
    pub fn find_any<'a>(&self, aliases: &[&'a str]) -> Option<(&'a str, &[CookieEntry])> {
        aliases
            .iter()
            .find_map(|alias| self.get(alias).map(|entries| (*alias, entries)))
    }
}
