// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::LedgerError;

/// Separator between the feed and the guid in a ledger line
pub const ENTRY_SEPARATOR: &str = " • ";

/// How an episode is looked up in the ledger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerMatch {
    /// The entry may appear anywhere in the file text. A guid that is a
    /// prefix of another archived guid counts as archived.
    #[default]
    Substring,
    /// The entry must equal a whole line
    Line,
}

/// Append-only record of which (feed, guid) pairs were downloaded
///
/// Single-process only: there is no file locking, so two runs sharing a
/// ledger can interleave appends.
#[derive(Debug, Clone)]
pub struct ArchiveLedger {
    path: PathBuf,
    match_mode: LedgerMatch,
}

/// Format a ledger line (without the trailing newline)
pub fn ledger_entry(feed: &str, guid: &str) -> String {
    format!("{feed}{ENTRY_SEPARATOR}{guid}")
}

impl ArchiveLedger {
    pub fn new(path: impl Into<PathBuf>, match_mode: LedgerMatch) -> Self {
        Self {
            path: path.into(),
            match_mode,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Create an empty ledger file if none exists yet
    pub fn ensure_created(&self) -> Result<(), LedgerError> {
        if self.exists() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| LedgerError::CreateFailed {
                path: self.path.clone(),
                source: e,
            })?;
        }

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map(|_| ())
            .map_err(|e| LedgerError::CreateFailed {
                path: self.path.clone(),
                source: e,
            })?;

        tracing::debug!("Created empty ledger at {}", self.path.display());
        Ok(())
    }

    /// Check whether the (feed, guid) pair has been archived
    ///
    /// A missing ledger file holds no entries.
    pub fn contains(&self, feed: &str, guid: &str) -> Result<bool, LedgerError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(LedgerError::ReadFailed {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        let entry = ledger_entry(feed, guid);
        Ok(match self.match_mode {
            LedgerMatch::Substring => text.contains(&entry),
            LedgerMatch::Line => text.lines().any(|line| line == entry),
        })
    }

    /// Record a completed download as a new line at the end of the ledger
    pub fn append(&self, feed: &str, guid: &str) -> Result<(), LedgerError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| LedgerError::WriteFailed {
                path: self.path.clone(),
                source: e,
            })?;

        let line = format!("{}\n", ledger_entry(feed, guid));
        file.write_all(line.as_bytes())
            .map_err(|e| LedgerError::WriteFailed {
                path: self.path.clone(),
                source: e,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const FEED: &str = "http://x.com/rss";

    #[test]
    fn ensure_created_makes_empty_file() {
        let dir = tempdir().unwrap();
        let ledger = ArchiveLedger::new(dir.path().join("podarchive.txt"), LedgerMatch::Substring);

        assert!(!ledger.exists());
        ledger.ensure_created().unwrap();
        assert!(ledger.exists());
        assert_eq!(std::fs::read_to_string(ledger.path()).unwrap(), "");
    }

    #[test]
    fn ensure_created_keeps_existing_entries() {
        let dir = tempdir().unwrap();
        let ledger = ArchiveLedger::new(dir.path().join("podarchive.txt"), LedgerMatch::Substring);

        ledger.append(FEED, "abc123").unwrap();
        ledger.ensure_created().unwrap();
        ledger.ensure_created().unwrap();

        assert!(ledger.contains(FEED, "abc123").unwrap());
    }

    #[test]
    fn ensure_created_makes_parent_directories() {
        let dir = tempdir().unwrap();
        let ledger = ArchiveLedger::new(
            dir.path().join("nested").join("podarchive.txt"),
            LedgerMatch::Line,
        );

        ledger.ensure_created().unwrap();
        assert!(ledger.exists());
    }

    #[test]
    fn append_writes_exact_line() {
        let dir = tempdir().unwrap();
        let ledger = ArchiveLedger::new(dir.path().join("podarchive.txt"), LedgerMatch::Substring);

        ledger.append(FEED, "abc123").unwrap();

        let text = std::fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(text, "http://x.com/rss • abc123\n");
        assert!(text.lines().any(|l| l == "http://x.com/rss • abc123"));
    }

    #[test]
    fn append_accumulates_lines() {
        let dir = tempdir().unwrap();
        let ledger = ArchiveLedger::new(dir.path().join("podarchive.txt"), LedgerMatch::Line);

        ledger.append(FEED, "one").unwrap();
        ledger.append(FEED, "two").unwrap();

        let text = std::fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(ledger.contains(FEED, "one").unwrap());
        assert!(ledger.contains(FEED, "two").unwrap());
    }

    #[test]
    fn contains_is_false_for_missing_file() {
        let dir = tempdir().unwrap();
        let ledger = ArchiveLedger::new(dir.path().join("absent.txt"), LedgerMatch::Substring);
        assert!(!ledger.contains(FEED, "abc").unwrap());
    }

    #[test]
    fn contains_distinguishes_feeds() {
        let dir = tempdir().unwrap();
        let ledger = ArchiveLedger::new(dir.path().join("podarchive.txt"), LedgerMatch::Line);

        ledger.append(FEED, "abc").unwrap();
        assert!(!ledger.contains("http://other.com/rss", "abc").unwrap());
    }

    #[test]
    fn substring_match_accepts_guid_prefix() {
        let dir = tempdir().unwrap();
        let ledger = ArchiveLedger::new(dir.path().join("podarchive.txt"), LedgerMatch::Substring);

        ledger.append(FEED, "episode-10").unwrap();
        assert!(ledger.contains(FEED, "episode-1").unwrap());
    }

    #[test]
    fn line_match_rejects_guid_prefix() {
        let dir = tempdir().unwrap();
        let ledger = ArchiveLedger::new(dir.path().join("podarchive.txt"), LedgerMatch::Line);

        ledger.append(FEED, "episode-10").unwrap();
        assert!(!ledger.contains(FEED, "episode-1").unwrap());
        assert!(ledger.contains(FEED, "episode-10").unwrap());
    }

    #[test]
    fn ledger_match_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: LedgerMatch,
        }

        let w: Wrapper = toml::from_str(r#"mode = "line""#).unwrap();
        assert_eq!(w.mode, LedgerMatch::Line);
    }
}
