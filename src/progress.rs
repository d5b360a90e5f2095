// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

/// Events emitted during an archive run for progress reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Feed is being fetched from URL
    FetchingFeed {
        url: String,
        /// 1-based attempt number
        attempt: u32,
        max_attempts: u32,
    },

    /// A feed fetch attempt failed and will be retried
    FetchFailed {
        attempt: u32,
        max_attempts: u32,
        error: String,
    },

    /// Feed has been parsed and the episode range applied
    FeedParsed {
        total_episodes: usize,
        selected_episodes: usize,
    },

    /// Episode is already in the ledger
    EpisodeSkipped {
        /// 1-based position in the feed
        episode_number: usize,
        episode_title: String,
    },

    /// A download is starting
    DownloadStarting {
        episode_number: usize,
        episode_title: String,
        file_name: String,
        /// Expected content length in bytes, if known
        content_length: Option<u64>,
    },

    /// Download progress update
    DownloadProgress {
        episode_number: usize,
        bytes_downloaded: u64,
        total_bytes: Option<u64>,
    },

    /// A download completed and was recorded in the ledger
    DownloadCompleted {
        episode_number: usize,
        episode_title: String,
        bytes_downloaded: u64,
    },

    /// A download failed; the episode stays eligible for a later run
    DownloadFailed {
        episode_number: usize,
        episode_title: String,
        error: String,
    },

    /// Every selected episode has been processed
    RunCompleted {
        downloaded_count: usize,
        skipped_count: usize,
        failed_count: usize,
    },
}

/// Trait for reporting progress events during an archive run.
///
/// Implementations can use this to display progress bars, log messages,
/// or collect statistics.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {}
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}

/// Collects every event, for assertions in tests
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingReporter {
    events: std::sync::Mutex<Vec<ProgressEvent>>,
}

#[cfg(test)]
impl RecordingReporter {
    pub(crate) fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl ProgressReporter for RecordingReporter {
    fn report(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_reporter_handles_all_events() {
        let reporter = NoopReporter;

        reporter.report(ProgressEvent::FetchingFeed {
            url: "https://example.com/feed.xml".to_string(),
            attempt: 1,
            max_attempts: 10,
        });

        reporter.report(ProgressEvent::FetchFailed {
            attempt: 1,
            max_attempts: 10,
            error: "HTTP status 503".to_string(),
        });

        reporter.report(ProgressEvent::FeedParsed {
            total_episodes: 10,
            selected_episodes: 5,
        });

        reporter.report(ProgressEvent::EpisodeSkipped {
            episode_number: 1,
            episode_title: "Episode 1".to_string(),
        });

        reporter.report(ProgressEvent::DownloadStarting {
            episode_number: 2,
            episode_title: "Episode 2".to_string(),
            file_name: "Episode 2.mp3".to_string(),
            content_length: Some(1024),
        });

        reporter.report(ProgressEvent::DownloadProgress {
            episode_number: 2,
            bytes_downloaded: 512,
            total_bytes: Some(1024),
        });

        reporter.report(ProgressEvent::DownloadCompleted {
            episode_number: 2,
            episode_title: "Episode 2".to_string(),
            bytes_downloaded: 1024,
        });

        reporter.report(ProgressEvent::DownloadFailed {
            episode_number: 3,
            episode_title: "Episode 3".to_string(),
            error: "Connection reset".to_string(),
        });

        reporter.report(ProgressEvent::RunCompleted {
            downloaded_count: 1,
            skipped_count: 1,
            failed_count: 1,
        });
    }

    #[test]
    fn recording_reporter_keeps_order() {
        let reporter = RecordingReporter::default();
        reporter.report(ProgressEvent::FeedParsed {
            total_episodes: 2,
            selected_episodes: 1,
        });
        reporter.report(ProgressEvent::RunCompleted {
            downloaded_count: 0,
            skipped_count: 1,
            failed_count: 0,
        });

        let events = reporter.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ProgressEvent::FeedParsed { .. }));
        assert!(matches!(events[1], ProgressEvent::RunCompleted { .. }));
    }
}
