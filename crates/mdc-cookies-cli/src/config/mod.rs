//! Configuration file resolution and persistence.

use std::path::{Path, PathBuf};

use mdc_cookies::remediation::CookieSink;
use mdc_cookies::{ConfigDocument, ConfigError, CookieEntry, PersistError};

/// Ordered list of candidate config paths. The first existing file wins.
#[derive(Debug, Clone)]
pub struct ConfigLocator {
    candidates: Vec<PathBuf>,
    create_at: PathBuf,
}

impl ConfigLocator {
    /// The standard search order:
    /// `./config.ini`, `~/mdc.ini`, `~/.mdc.ini`, `~/.mdc/config.ini`,
    /// `~/.config/mdc/config.ini`. New files go to `~/.mdc/config.ini`.
    pub fn standard() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::for_home(&home)
    }

    /// The standard search order rooted at `home`.
    pub fn for_home(home: &Path) -> Self {
        Self {
            candidates: vec![
                PathBuf::from("./config.ini"),
                home.join("mdc.ini"),
                home.join(".mdc.ini"),
                home.join(".mdc").join("config.ini"),
                home.join(".config").join("mdc").join("config.ini"),
            ],
            create_at: home.join(".mdc").join("config.ini"),
        }
    }

    /// A locator over explicit candidates.
    pub fn with_candidates(candidates: Vec<PathBuf>, create_at: PathBuf) -> Self {
        Self {
            candidates,
            create_at,
        }
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// Where a new config is created when none exists.
    pub fn create_at(&self) -> &Path {
        &self.create_at
    }

    /// First candidate that exists as a file.
    pub fn resolve(&self) -> Option<PathBuf> {
        let found = self.candidates.iter().find(|p| p.is_file()).cloned();
        match &found {
            Some(path) => tracing::debug!("Using config at {}", path.display()),
            None => tracing::debug!("No config in {} candidate(s)", self.candidates.len()),
        }
        found
    }

    /// `explicit` if given (it must exist), otherwise the first candidate.
    pub fn resolve_explicit(&self, explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
        if let Some(path) = explicit {
            if path.is_file() {
                return Ok(path.to_path_buf());
            }
            return Err(ConfigError::Missing(path.display().to_string()));
        }

        self.resolve().ok_or_else(|| ConfigError::NotFound {
            searched: self
                .candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
        })
    }
}

/// Read and parse a config file.
pub fn read_document(path: &Path) -> Result<ConfigDocument, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    ConfigDocument::parse(&text)
}

/// Write `document` to `path`, creating parent directories, then restrict
/// the file to its owner where the platform allows it.
pub fn write_document(path: &Path, document: &ConfigDocument) -> Result<(), PersistError> {
    let io_err = |source| PersistError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    std::fs::write(path, document.render()).map_err(io_err)?;
    restrict_permissions(path).map_err(io_err)?;

    tracing::info!("Wrote config to {}", path.display());
    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Persists validated cookies into a config file, keeping its other sections.
pub struct ConfigFileSink {
    path: PathBuf,
    document: ConfigDocument,
}

impl ConfigFileSink {
    pub fn new(path: PathBuf, document: ConfigDocument) -> Self {
        Self { path, document }
    }
}

impl CookieSink for ConfigFileSink {
    fn persist(&mut self, domain: &str, cookies: &[CookieEntry]) -> Result<String, PersistError> {
        self.document.set_cookies(domain, cookies);
        write_document(&self.path, &self.document)?;
        Ok(self.path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_order() {
        let locator = ConfigLocator::for_home(Path::new("/home/u"));
        let names: Vec<String> = locator
            .candidates()
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "./config.ini",
                "/home/u/mdc.ini",
                "/home/u/.mdc.ini",
                "/home/u/.mdc/config.ini",
                "/home/u/.config/mdc/config.ini",
            ]
        );
        assert_eq!(locator.create_at(), Path::new("/home/u/.mdc/config.ini"));
    }

    #[test]
    fn test_first_existing_wins() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.ini");
        let b = dir.path().join("b.ini");
        let c = dir.path().join("c.ini");
        std::fs::write(&b, "[cookies]\n").unwrap();
        std::fs::write(&c, "[cookies]\n").unwrap();

        let locator =
            ConfigLocator::with_candidates(vec![a, b.clone(), c], dir.path().join("new.ini"));
        assert_eq!(locator.resolve(), Some(b));
    }

    #[test]
    fn test_nothing_found_lists_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let locator = ConfigLocator::with_candidates(
            vec![dir.path().join("missing.ini")],
            dir.path().join("new.ini"),
        );
        match locator.resolve_explicit(None) {
            Err(ConfigError::NotFound { searched }) => assert_eq!(searched.len(), 1),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let locator = ConfigLocator::with_candidates(Vec::new(), dir.path().join("new.ini"));
        let missing = dir.path().join("nope.ini");
        assert!(matches!(
            locator.resolve_explicit(Some(&missing)),
            Err(ConfigError::Missing(_))
        ));
    }

    #[test]
    fn test_sink_writes_header_and_cookies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".mdc").join("config.ini");
        let mut sink = ConfigFileSink::new(path.clone(), ConfigDocument::new());

        let location = sink
            .persist(
                "www.javbus.com",
                &[
                    CookieEntry::new("dv", "1"),
                    CookieEntry::new("existmag", "mag"),
                    CookieEntry::new("PHPSESSID", "abc123def456"),
                ],
            )
            .unwrap();
        assert_eq!(location, path.display().to_string());

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# MovieMeta Configuration File"));
        let store = read_document(&path).unwrap().cookie_store().unwrap();
        assert_eq!(store.get("www.javbus.com").unwrap().len(), 3);
    }

    #[test]
    fn test_sink_keeps_other_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(
            &path,
            "[common]\nmain_mode = 1\n\n[cookies]\njavdb.com = _jdb_session=keep\n",
        )
        .unwrap();

        let document = read_document(&path).unwrap();
        let mut sink = ConfigFileSink::new(path.clone(), document);
        sink.persist("www.javbus.com", &[CookieEntry::new("PHPSESSID", "abc123def456")])
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("[common]"));
        let store = read_document(&path).unwrap().cookie_store().unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("javdb.com").unwrap()[0].value, "keep");
    }

    #[test]
    fn test_sink_round_trips_comment_chars() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        let cookies = [
            CookieEntry::new("dv", "1"),
            CookieEntry::new("PHPSESSID", "abc#def123456"),
            CookieEntry::new("existmag", "mag"),
        ];
        let mut sink = ConfigFileSink::new(path.clone(), ConfigDocument::new());
        sink.persist("www.javbus.com", &cookies).unwrap();

        let store = read_document(&path).unwrap().cookie_store().unwrap();
        assert_eq!(store.get("www.javbus.com").unwrap(), &cookies[..]);
    }

    #[cfg(unix)]
    #[test]
    fn test_written_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        write_document(&path, &ConfigDocument::new()).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
