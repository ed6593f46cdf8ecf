//! On-disk settings.
//!
//! Stored as JSON at `$CONFIG_DIR/mailpeek/settings.json`. Every field is
//! optional in the file; missing ones take their defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::hosts::{DEFAULT_FALLBACK_HOSTS, HostTable};

/// Default IMAP port (implicit TLS).
pub const DEFAULT_PORT: u16 = 993;

/// Default number of messages returned by one fetch.
pub const DEFAULT_LIMIT: usize = 50;

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// IMAP port.
    pub port: u16,
    /// Per-host connect timeout, in seconds.
    pub connect_timeout_secs: u64,
    /// Socket read/write timeout, in seconds.
    pub io_timeout_secs: u64,
    /// Extra or overriding domain → host entries.
    pub hosts: BTreeMap<String, String>,
    /// Hosts tried, in order, for unmapped domains.
    pub fallback_hosts: Vec<String>,
    /// Messages fetched when no limit is given.
    pub default_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            connect_timeout_secs: 30,
            io_timeout_secs: 60,
            hosts: BTreeMap::new(),
            fallback_hosts: DEFAULT_FALLBACK_HOSTS.iter().map(ToString::to_string).collect(),
            default_limit: DEFAULT_LIMIT,
        }
    }
}

impl Settings {
    /// Default settings file location, if the platform has a config dir.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mailpeek").join("settings.json"))
    }

    /// Loads settings from the default location, or defaults if there is no
    /// file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Loads settings from `path`, or defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        settings.validate()?;

        debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    /// Writes settings to `path` as pretty JSON, creating parent dirs.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::Config("port must be 1-65535".to_string()));
        }
        if self.connect_timeout_secs == 0 {
            return Err(Error::Config(
                "connect_timeout_secs must be positive".to_string(),
            ));
        }
        if self.io_timeout_secs == 0 {
            return Err(Error::Config("io_timeout_secs must be positive".to_string()));
        }
        if self.fallback_hosts.is_empty() {
            return Err(Error::Config(
                "fallback_hosts must name at least one host".to_string(),
            ));
        }
        if self.fallback_hosts.iter().any(|h| h.trim().is_empty()) {
            return Err(Error::Config("fallback_hosts contains a blank entry".to_string()));
        }
        Ok(())
    }

    /// Connect timeout as a duration.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// I/O timeout as a duration.
    #[must_use]
    pub const fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }

    /// Built-in host table with these settings' overrides applied.
    #[must_use]
    pub fn host_table(&self) -> HostTable {
        HostTable::builtin()
            .with_hosts(self.hosts.iter().map(|(k, v)| (k.as_str(), v.clone())))
            .with_fallback(self.fallback_hosts.iter().cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.port, 993);
        assert_eq!(settings.connect_timeout(), Duration::from_secs(30));
        assert_eq!(settings.io_timeout(), Duration::from_secs(60));
        assert_eq!(settings.default_limit, 50);
        assert_eq!(
            settings.fallback_hosts,
            vec!["imap.firstmail.ltd", "imap.notletters.com"]
        );
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mailpeek").join("settings.json");

        let mut settings = Settings::default();
        settings.hosts.insert("corp.example".into(), "mail.corp.example".into());
        settings.default_limit = 10;
        settings.save_to(&path).unwrap();

        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "port": 1993, "fallback_hosts": ["only.example"] }"#).unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.port, 1993);
        assert_eq!(settings.connect_timeout_secs, 30);
        assert_eq!(settings.fallback_hosts, vec!["only.example"]);
    }

    #[test]
    fn malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Settings::load_from(&path), Err(Error::Config(_))));

        std::fs::write(&path, r#"{ "port": 0 }"#).unwrap();
        assert!(matches!(Settings::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn empty_fallback_list_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        std::fs::write(&path, r#"{ "fallback_hosts": [] }"#).unwrap();
        let err = Settings::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("fallback_hosts")), "{err}");

        std::fs::write(&path, r#"{ "fallback_hosts": ["imap.example", "  "] }"#).unwrap();
        assert!(matches!(Settings::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn host_table_merges_overrides() {
        let mut settings = Settings::default();
        settings.hosts.insert("GMAIL.com".into(), "proxy.local".into());
        settings.fallback_hosts = vec!["a.example".into(), "b.example".into()];

        let table = settings.host_table();
        assert_eq!(table.candidates("gmail.com"), vec!["proxy.local"]);
        assert_eq!(table.candidates("yahoo.com"), vec!["imap.mail.yahoo.com"]);
        assert_eq!(table.candidates("x.example"), vec!["a.example", "b.example"]);
    }
}
