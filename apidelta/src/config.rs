//! Optional TOML configuration.
//!
//! ```toml
//! base = "origin/main"
//! extensions = ["go"]
//! detect_renames = true
//! ```

use std::path::{Path, PathBuf};

use apidelta_core::Result;
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base ref used when `--base` is not given.
    pub base: String,
    /// Extensions (without the dot) of files whose symbols are extracted.
    pub extensions: Vec<String>,
    pub detect_renames: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base: "origin/main".to_owned(),
            extensions: vec!["go".to_owned()],
            detect_renames: true,
        }
    }
}

impl Config {
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Loads configuration.
    ///
    /// An `explicit` path must exist and parse. Otherwise the user config
    /// file is read if present; a parse error there is logged and defaults
    /// are used instead.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            let raw = std::fs::read_to_string(path)?;
            return Self::parse(&raw);
        }

        let path = config_path();
        let raw = match std::fs::read_to_string(&path) {
            Ok(s) => s,
            Err(_) => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
        };
        match Self::parse(&raw) {
            Ok(config) => Ok(config),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable config");
                Ok(Self::default())
            }
        }
    }
}

/// Returns the path to the apidelta config file.
///
/// Prefers `$XDG_CONFIG_HOME/apidelta/config.toml`; falls back to
/// `~/.config/apidelta/config.toml` when the env var is absent.
pub fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("apidelta").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let config = Config::parse("base = \"develop\"\n").unwrap();
        assert_eq!(config.base, "develop");
        assert_eq!(config.extensions, vec!["go"]);
        assert!(config.detect_renames);
    }

    #[test]
    fn full_file() {
        let config =
            Config::parse("base = \"v1.0\"\nextensions = [\"go\", \"gox\"]\ndetect_renames = false\n")
                .unwrap();
        assert_eq!(
            config,
            Config {
                base: "v1.0".to_owned(),
                extensions: vec!["go".to_owned(), "gox".to_owned()],
                detect_renames: false,
            }
        );
    }

    #[test]
    fn explicit_path_errors_are_fatal() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "extensions = 3\n").unwrap();
        assert!(Config::load(Some(&path)).is_err());
        assert!(Config::load(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
