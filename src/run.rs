// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use url::Url;

use crate::episode::{DownloadOutcome, DownloadTarget, EpisodeRange, download_episode};
use crate::error::{FeedError, RunError};
use crate::feed::{RetryPolicy, fetch_feed_with_retry, parse_episodes, parse_feed};
use crate::http::HttpClient;
use crate::ledger::ArchiveLedger;
use crate::progress::{ProgressEvent, SharedProgressReporter};

/// Everything one archive run needs to know
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Feed URL; also the feed half of every ledger entry
    pub feed_url: String,
    pub range: EpisodeRange,
    pub download_folder: PathBuf,
    pub ledger: ArchiveLedger,
    pub retry: RetryPolicy,
}

/// Result of an archive run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of episodes successfully downloaded
    pub downloaded: usize,
    /// Number of episodes skipped (already in the ledger)
    pub skipped: usize,
    /// Number of episodes that failed to download
    pub failed: usize,
    /// Details of failed episodes (title, error message)
    pub failed_episodes: Vec<(String, String)>,
}

/// Archive the selected episodes of a feed
///
/// This is the main entry point for the library. It:
/// 1. Creates the download folder and the ledger if missing
/// 2. Fetches the feed, retrying per `options.retry`
/// 3. Parses one record per feed item
/// 4. Downloads the selected episodes one after another, in feed order
///
/// A single failed episode is logged and counted; the run moves on. Only a
/// feed that cannot be fetched or parsed ends the run early, before any
/// episode is touched.
pub async fn run_archive<C: HttpClient>(
    client: &C,
    options: &RunOptions,
    reporter: SharedProgressReporter,
) -> Result<RunSummary, RunError> {
    let feed_url = options.feed_url.trim();
    if feed_url.is_empty() {
        return Err(RunError::NoFeed);
    }
    Url::parse(feed_url).map_err(|e| RunError::Feed(FeedError::InvalidUrl(e)))?;

    std::fs::create_dir_all(&options.download_folder).map_err(|e| {
        RunError::CreateFolderFailed {
            path: options.download_folder.clone(),
            source: e,
        }
    })?;
    options.ledger.ensure_created()?;

    let bytes = fetch_feed_with_retry(client, feed_url, &options.retry, &reporter).await?;
    let document = parse_feed(&bytes)?;
    let episodes = parse_episodes(&document);

    let selected = options.range.indices(episodes.len());
    tracing::debug!(
        "Feed has {} episodes, processing indices {:?}",
        episodes.len(),
        selected
    );

    reporter.report(ProgressEvent::FeedParsed {
        total_episodes: episodes.len(),
        selected_episodes: selected.len(),
    });

    let target = DownloadTarget {
        folder: &options.download_folder,
        feed: feed_url,
        ledger: &options.ledger,
    };

    let mut summary = RunSummary::default();

    for index in selected {
        let episode = &episodes[index];
        let episode_number = index + 1;

        match download_episode(client, episode, episode_number, &target, &reporter).await {
            Ok(DownloadOutcome::AlreadyArchived) => summary.skipped += 1,
            Ok(DownloadOutcome::Downloaded { .. }) => summary.downloaded += 1,
            Err(e) => {
                tracing::debug!("Error downloading episode \"{}\": {}", episode.title, e);
                reporter.report(ProgressEvent::DownloadFailed {
                    episode_number,
                    episode_title: episode.title.clone(),
                    error: e.to_string(),
                });
                summary.failed += 1;
                summary
                    .failed_episodes
                    .push((episode.title.clone(), e.to_string()));
            }
        }
    }

    reporter.report(ProgressEvent::RunCompleted {
        downloaded_count: summary.downloaded,
        skipped_count: summary.skipped,
        failed_count: summary.failed,
    });

    Ok(summary)
}
