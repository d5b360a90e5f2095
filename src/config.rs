// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::feed::RetryPolicy;
use crate::ledger::LedgerMatch;

/// Config file picked up from the working directory when no path is given
pub const LOCAL_CONFIG_FILE: &str = "podarchive.toml";

pub const DEFAULT_DOWNLOAD_FOLDER: &str = "downloaded_podcast";
pub const DEFAULT_LEDGER_FILE: &str = "podarchive.txt";

/// Settings for an archive run
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Feed used when none is given on the command line or at the prompt
    pub default_feed: Option<String>,
    pub download_folder: PathBuf,
    pub ledger_path: PathBuf,
    /// Total feed fetch attempts before giving up
    pub fetch_attempts: u32,
    pub retry_delay_ms: u64,
    /// Per-request timeout; unset means wait indefinitely
    pub request_timeout_secs: Option<u64>,
    pub ledger_match: LedgerMatch,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_feed: None,
            download_folder: PathBuf::from(DEFAULT_DOWNLOAD_FOLDER),
            ledger_path: PathBuf::from(DEFAULT_LEDGER_FILE),
            fetch_attempts: 10,
            retry_delay_ms: 0,
            request_timeout_secs: None,
            ledger_match: LedgerMatch::Substring,
        }
    }
}

impl Config {
    /// Load configuration
    ///
    /// An explicit `path` must exist. Without one, `podarchive.toml` in the
    /// working directory is used if present, otherwise the defaults.
    /// `PODARCHIVE_*` environment variables are applied on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let local = Path::new(LOCAL_CONFIG_FILE);
                if local.exists() {
                    Self::from_file(local)?
                } else {
                    tracing::debug!("No config file found, using defaults");
                    Self::default()
                }
            }
        };

        let config = config.with_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config = toml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        tracing::debug!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Apply `PODARCHIVE_FEED`, `PODARCHIVE_FOLDER` and `PODARCHIVE_LEDGER`
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(feed) = lookup("PODARCHIVE_FEED").filter(|v| !v.trim().is_empty()) {
            self.default_feed = Some(feed);
        }
        if let Some(folder) = lookup("PODARCHIVE_FOLDER").filter(|v| !v.is_empty()) {
            self.download_folder = PathBuf::from(folder);
        }
        if let Some(ledger) = lookup("PODARCHIVE_LEDGER").filter(|v| !v.is_empty()) {
            self.ledger_path = PathBuf::from(ledger);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch_attempts == 0 {
            return Err(ConfigError::Invalid(
                "fetch_attempts must be at least 1".to_string(),
            ));
        }
        if self.download_folder.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "download_folder must not be empty".to_string(),
            ));
        }
        if self.ledger_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "ledger_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.fetch_attempts,
            delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
