// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub mod config;
pub mod episode;
pub mod error;
pub mod feed;
pub mod http;
pub mod ledger;
pub mod progress;
pub mod run;

// Re-export main types for convenience
pub use config::Config;
pub use episode::{DownloadOutcome, DownloadTarget, EpisodeRange, download_episode, generate_filename};
pub use error::{ConfigError, DownloadError, FeedError, HttpError, LedgerError, RunError};
pub use feed::{
    Episode, FeedDocument, RetryPolicy, extract_enclosure_urls, extract_titles_and_guids,
    fetch_feed, fetch_feed_with_retry, parse_episodes, parse_feed,
};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use ledger::{ArchiveLedger, LedgerMatch};
pub use progress::{NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter};
pub use run::{RunOptions, RunSummary, run_archive};
