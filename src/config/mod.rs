//! Repository configuration.
//!
//! The optional `.gitty/config` file uses an INI-like format:
//!
//! ```text
//! [user]
//!     name = Jane Doe
//!     email = jane@example.com
//! ```
//!
//! Section and key names are case-insensitive; subsection names are not.
//!
//! # Example
//!
//! ```
//! use gitty::config::Config;
//!
//! let config: Config = "[user]\nname = Jane\n".parse().unwrap();
//! assert_eq!(config.get("user", "name"), Some("Jane"));
//! assert_eq!(config.identity(), ("Jane".to_string(), "default@example.com".to_string()));
//! ```

mod parser;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::infra::Backend;
use crate::objects::Signature;

/// Name of the config file inside the marker directory.
pub const CONFIG_FILE: &str = "config";

/// Author name used when `user.name` is not configured.
pub const DEFAULT_NAME: &str = "Default Author";

/// Author email used when `user.email` is not configured.
pub const DEFAULT_EMAIL: &str = "default@example.com";

type Keys = BTreeMap<String, String>;

/// A parsed configuration: section -> subsection -> key -> value.
///
/// The subsection is the empty string for plain `[section]` headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    entries: BTreeMap<String, BTreeMap<String, Keys>>,
}

impl Config {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Config::default()
    }

    /// Loads `config` through a backend. A missing file is an empty config.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidUtf8` if the file is not UTF-8
    /// - `Error::InvalidConfig` for a malformed line
    pub fn load(backend: &dyn Backend) -> Result<Self> {
        match backend.read_to_string(Path::new(CONFIG_FILE)) {
            Ok(text) => text.parse(),
            Err(Error::PathNotFound(_)) => Ok(Config::new()),
            Err(e) => Err(e),
        }
    }

    /// Writes the configuration back through a backend.
    pub fn save(&self, backend: &dyn Backend) -> Result<()> {
        backend.write(Path::new(CONFIG_FILE), self.to_string().as_bytes())
    }

    /// Gets a value from a section without subsection.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.get_subsection(section, "", key)
    }

    /// Gets a value from `[section "subsection"]`.
    pub fn get_subsection(&self, section: &str, subsection: &str, key: &str) -> Option<&str> {
        self.entries
            .get(&section.to_lowercase())?
            .get(subsection)?
            .get(&key.to_lowercase())
            .map(String::as_str)
    }

    /// Gets a boolean value.
    ///
    /// Accepts `true/yes/on/1` and `false/no/off/0`, case-insensitively.
    /// Returns `None` if the key is missing or the value is not a boolean.
    pub fn get_bool(&self, section: &str, key: &str) -> Option<bool> {
        self.get(section, key).and_then(parse_bool)
    }

    /// Sets a value, creating the section as needed.
    pub fn set(&mut self, section: &str, subsection: &str, key: &str, value: &str) {
        self.entries
            .entry(section.to_lowercase())
            .or_default()
            .entry(subsection.to_string())
            .or_default()
            .insert(key.to_lowercase(), value.to_string());
    }

    /// Removes a value. Returns true if it was present.
    pub fn unset(&mut self, section: &str, subsection: &str, key: &str) -> bool {
        let section_key = section.to_lowercase();
        let Some(subsections) = self.entries.get_mut(&section_key) else {
            return false;
        };
        let Some(keys) = subsections.get_mut(subsection) else {
            return false;
        };
        let removed = keys.remove(&key.to_lowercase()).is_some();
        if keys.is_empty() {
            subsections.remove(subsection);
        }
        if subsections.is_empty() {
            self.entries.remove(&section_key);
        }
        removed
    }

    /// Returns the section names, sorted.
    pub fn sections(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Returns true if no values are set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the configured `(user.name, user.email)`, with defaults.
    pub fn identity(&self) -> (String, String) {
        let name = self.get("user", "name").unwrap_or(DEFAULT_NAME);
        let email = self.get("user", "email").unwrap_or(DEFAULT_EMAIL);
        (name.to_string(), email.to_string())
    }

    /// Returns a signature for the configured identity, stamped now.
    pub fn signature(&self) -> Signature {
        let (name, email) = self.identity();
        Signature::now(name, email)
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parser::parse(s)
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (section, subsections) in &self.entries {
            for (subsection, keys) in subsections {
                if subsection.is_empty() {
                    writeln!(f, "[{}]", section)?;
                } else {
                    let escaped = subsection.replace('\\', "\\\\").replace('"', "\\\"");
                    writeln!(f, "[{} \"{}\"]", section, escaped)?;
                }
                for (key, value) in keys {
                    writeln!(f, "\t{} = {}", key, parser::quote_value(value))?;
                }
            }
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::MemoryBackend;

    #[test]
    fn test_get_and_set() {
        let mut config = Config::new();
        assert!(config.is_empty());

        config.set("User", "", "Name", "Jane");
        config.set("branch", "feature/x", "description", "wip");

        assert_eq!(config.get("user", "name"), Some("Jane"));
        assert_eq!(config.get("USER", "NAME"), Some("Jane"));
        assert_eq!(
            config.get_subsection("branch", "feature/x", "description"),
            Some("wip")
        );
        assert_eq!(config.get("branch", "description"), None);
        assert_eq!(config.sections(), vec!["branch", "user"]);
    }

    #[test]
    fn test_get_bool() {
        let config: Config = "[core]\na = yes\nb = Off\nc = maybe\nd\n".parse().unwrap();
        assert_eq!(config.get_bool("core", "a"), Some(true));
        assert_eq!(config.get_bool("core", "b"), Some(false));
        assert_eq!(config.get_bool("core", "c"), None);
        assert_eq!(config.get_bool("core", "d"), Some(true));
        assert_eq!(config.get_bool("core", "missing"), None);
    }

    #[test]
    fn test_unset() {
        let mut config = Config::new();
        config.set("user", "", "name", "Jane");
        assert!(config.unset("user", "", "NAME"));
        assert!(!config.unset("user", "", "name"));
        assert!(config.is_empty());
    }

    #[test]
    fn test_identity_defaults() {
        let config = Config::new();
        assert_eq!(
            config.identity(),
            (DEFAULT_NAME.to_string(), DEFAULT_EMAIL.to_string())
        );

        let config: Config = "[user]\nname = Jane\nemail = jane@example.com\n"
            .parse()
            .unwrap();
        let sig = config.signature();
        assert_eq!(sig.name(), "Jane");
        assert_eq!(sig.email(), "jane@example.com");
    }

    #[test]
    fn test_display_parses_back() {
        let mut config = Config::new();
        config.set("user", "", "name", "Jane Doe");
        config.set("user", "", "note", "  spaced ; with comment chars # ");
        config.set("branch", "we\"ird", "merge", "main");

        let text = config.to_string();
        assert!(text.starts_with("[branch \"we\\\"ird\"]\n"));
        let reparsed: Config = text.parse().unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn test_load_and_save() {
        let backend = MemoryBackend::new();
        assert!(Config::load(&backend).unwrap().is_empty());

        let mut config = Config::new();
        config.set("user", "", "email", "a@b.c");
        config.save(&backend).unwrap();

        let loaded = Config::load(&backend).unwrap();
        assert_eq!(loaded.get("user", "email"), Some("a@b.c"));
    }

    #[test]
    fn test_load_malformed() {
        let backend = MemoryBackend::new();
        backend
            .write(Path::new(CONFIG_FILE), b"[user]\nname = x\n[oops\n")
            .unwrap();
        assert!(matches!(
            Config::load(&backend),
            Err(Error::InvalidConfig { line: 3, .. })
        ));
    }
}
