//! Domain to IMAP host resolution.

use std::collections::HashMap;

/// Hosts tried, in order, for domains with no known server.
pub const DEFAULT_FALLBACK_HOSTS: [&str; 2] = ["imap.firstmail.ltd", "imap.notletters.com"];

/// Well-known providers.
const BUILTIN_HOSTS: &[(&str, &str)] = &[
    ("gmail.com", "imap.gmail.com"),
    ("googlemail.com", "imap.gmail.com"),
    ("outlook.com", "outlook.office365.com"),
    ("hotmail.com", "outlook.office365.com"),
    ("live.com", "outlook.office365.com"),
    ("yahoo.com", "imap.mail.yahoo.com"),
    ("icloud.com", "imap.mail.me.com"),
    ("me.com", "imap.mail.me.com"),
    ("aol.com", "imap.aol.com"),
    ("gmx.com", "imap.gmx.com"),
    ("gmx.net", "imap.gmx.net"),
    ("yandex.ru", "imap.yandex.ru"),
    ("yandex.com", "imap.yandex.com"),
    ("mail.ru", "imap.mail.ru"),
    ("bk.ru", "imap.mail.ru"),
    ("inbox.ru", "imap.mail.ru"),
    ("list.ru", "imap.mail.ru"),
    ("rambler.ru", "imap.rambler.ru"),
    ("firstmail.ltd", "imap.firstmail.ltd"),
    ("notletters.com", "imap.notletters.com"),
];

/// Lookup table from mail domain to IMAP host, plus the ordered fallback
/// list used for unmapped domains.
///
/// Immutable once built; sessions share it through `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTable {
    hosts: HashMap<String, String>,
    fallback: Vec<String>,
}

impl Default for HostTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl HostTable {
    /// Table with the built-in providers and the default fallback hosts.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            hosts: BUILTIN_HOSTS
                .iter()
                .map(|(domain, host)| ((*domain).to_string(), (*host).to_string()))
                .collect(),
            fallback: DEFAULT_FALLBACK_HOSTS.iter().map(ToString::to_string).collect(),
        }
    }

    /// Table with no mapped domains.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            hosts: HashMap::new(),
            fallback: DEFAULT_FALLBACK_HOSTS.iter().map(ToString::to_string).collect(),
        }
    }

    /// Adds or replaces a mapping.
    #[must_use]
    pub fn with_host(mut self, domain: &str, host: impl Into<String>) -> Self {
        self.hosts.insert(normalize(domain), host.into());
        self
    }

    /// Adds or replaces every mapping in `entries`.
    #[must_use]
    pub fn with_hosts<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (domain, host) in entries {
            self.hosts.insert(normalize(domain.as_ref()), host.into());
        }
        self
    }

    /// Replaces the fallback list.
    #[must_use]
    pub fn with_fallback<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Looks up the host for a domain.
    #[must_use]
    pub fn get(&self, domain: &str) -> Option<&str> {
        self.hosts.get(&normalize(domain)).map(String::as_str)
    }

    /// The fallback list.
    #[must_use]
    pub fn fallback(&self) -> &[String] {
        &self.fallback
    }

    /// Hosts to try for `domain`, in order: the mapped host alone, or the
    /// fallback list when the domain is unmapped.
    #[must_use]
    pub fn candidates(&self, domain: &str) -> Vec<String> {
        self.get(domain)
            .map_or_else(|| self.fallback.clone(), |host| vec![host.to_string()])
    }
}

fn normalize(domain: &str) -> String {
    domain.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapped_domain_single_candidate() {
        let table = HostTable::builtin();
        assert_eq!(table.candidates("gmail.com"), vec!["imap.gmail.com"]);
        assert_eq!(table.candidates(" GMail.Com "), vec!["imap.gmail.com"]);
    }

    #[test]
    fn unmapped_domain_uses_fallback_in_order() {
        let table = HostTable::builtin();
        assert_eq!(
            table.candidates("unknown.example"),
            vec!["imap.firstmail.ltd", "imap.notletters.com"]
        );
    }

    #[test]
    fn overrides() {
        let table = HostTable::empty()
            .with_host("Corp.Example", "mail.corp.example")
            .with_fallback(["backup.example"]);
        assert_eq!(table.candidates("corp.example"), vec!["mail.corp.example"]);
        assert_eq!(table.candidates("other.example"), vec!["backup.example"]);
        assert_eq!(table.get("gmail.com"), None);
    }

    #[test]
    fn with_hosts_replaces_builtin() {
        let table = HostTable::builtin().with_hosts([("gmail.com", "proxy.local")]);
        assert_eq!(table.get("gmail.com"), Some("proxy.local"));
    }
}
