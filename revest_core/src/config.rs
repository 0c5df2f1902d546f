//! # Store Configuration
//!
//! Decides where the durable state slot lives.
//!
//! The data directory is resolved in this order:
//!
//! 1. An explicit path (e.g. the CLI `--data-dir` flag)
//! 2. The `REVESTMASTER_DATA_DIR` environment variable
//! 3. The platform local data directory, plus `revestmaster`
//! 4. The current directory
//!
//! The slot itself is `<data_dir>/<namespace>.json`.

use std::ffi::OsString;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Fixed key under which the store is persisted
pub const DEFAULT_NAMESPACE: &str = "revestmaster_state";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "REVESTMASTER_DATA_DIR";

const APP_DIR_NAME: &str = "revestmaster";

/// Location of the persisted store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the state file and its lock
    pub data_dir: PathBuf,

    /// Slot key, used as the state file stem
    pub namespace: String,
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        StoreConfig {
            data_dir: data_dir.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    /// Resolve the configuration from an optional explicit directory and the
    /// process environment.
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        Self::resolve_with(explicit, std::env::var_os(DATA_DIR_ENV))
    }

    fn resolve_with(explicit: Option<PathBuf>, env_dir: Option<OsString>) -> Self {
        let data_dir = explicit
            .or_else(|| env_dir.filter(|v| !v.is_empty()).map(PathBuf::from))
            .unwrap_or_else(default_data_dir);
        StoreConfig::new(data_dir)
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Path of the JSON state file
    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.json", self.namespace))
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::new(default_data_dir())
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_path() {
        let config = StoreConfig::new("/tmp/revest");
        assert_eq!(config.state_path(), PathBuf::from("/tmp/revest/revestmaster_state.json"));

        let config = config.with_namespace("other");
        assert_eq!(config.state_path(), PathBuf::from("/tmp/revest/other.json"));
    }

    #[test]
    fn test_explicit_dir_wins() {
        let config = StoreConfig::resolve_with(
            Some(PathBuf::from("/explicit")),
            Some(OsString::from("/from-env")),
        );
        assert_eq!(config.data_dir, PathBuf::from("/explicit"));
    }

    #[test]
    fn test_env_dir_used() {
        let config = StoreConfig::resolve_with(None, Some(OsString::from("/from-env")));
        assert_eq!(config.data_dir, PathBuf::from("/from-env"));
    }

    #[test]
    fn test_empty_env_ignored() {
        let config = StoreConfig::resolve_with(None, Some(OsString::new()));
        assert_eq!(config.data_dir, default_data_dir());
        assert_eq!(config.namespace, DEFAULT_NAMESPACE);
    }
}
