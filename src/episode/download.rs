// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::DownloadError;
use crate::feed::Episode;
use crate::http::HttpClient;
use crate::ledger::ArchiveLedger;
use crate::progress::{ProgressEvent, SharedProgressReporter};

use super::filename::generate_filename;

/// Size of the slices written to disk between progress updates
pub const CHUNK_SIZE: usize = 8192;

/// Where a download lands and how it is recorded
#[derive(Debug, Clone, Copy)]
pub struct DownloadTarget<'a> {
    /// Folder receiving the media file
    pub folder: &'a Path,
    /// Feed identifier used as the first half of the ledger entry
    pub feed: &'a str,
    pub ledger: &'a ArchiveLedger,
}

/// What happened to an episode that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The ledger already had the episode; nothing was requested
    AlreadyArchived,
    /// The media file was written and the ledger entry appended
    Downloaded { path: PathBuf, bytes: u64 },
}

/// Download one episode into the target folder unless it is already archived
///
/// The ledger entry is appended only after the whole body has been written
/// and flushed, so an interrupted download is retried on the next run. A
/// partially written file is left in place and overwritten later.
pub async fn download_episode<C: HttpClient>(
    client: &C,
    episode: &Episode,
    episode_number: usize,
    target: &DownloadTarget<'_>,
    reporter: &SharedProgressReporter,
) -> Result<DownloadOutcome, DownloadError> {
    let file_name = generate_filename(episode);

    if target.ledger.contains(target.feed, &episode.guid)? {
        tracing::info!(
            "Skipping episode \"{}\" because it has already been downloaded",
            episode.title
        );
        reporter.report(ProgressEvent::EpisodeSkipped {
            episode_number,
            episode_title: episode.title.clone(),
        });
        return Ok(DownloadOutcome::AlreadyArchived);
    }

    tracing::info!(
        "Downloading episode \"{}\" as \"{}\"",
        episode.title,
        file_name
    );

    let url = episode.enclosure_url.as_str();
    let output_path = target.folder.join(&file_name);

    let response = client
        .get_stream(url)
        .await
        .map_err(|e| DownloadError::HttpFailed {
            url: url.to_string(),
            source: e,
        })?;

    if !(200..300).contains(&response.status) {
        return Err(DownloadError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        });
    }

    reporter.report(ProgressEvent::DownloadStarting {
        episode_number,
        episode_title: episode.title.clone(),
        file_name: file_name.clone(),
        content_length: response.content_length,
    });

    let mut file =
        File::create(&output_path)
            .await
            .map_err(|e| DownloadError::FileCreateFailed {
                path: output_path.clone(),
                source: e,
            })?;

    let mut bytes_downloaded: u64 = 0;
    let mut stream = response.body;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::StreamFailed {
            url: url.to_string(),
            source: e,
        })?;

        for slice in chunk.chunks(CHUNK_SIZE) {
            file.write_all(slice)
                .await
                .map_err(|e| DownloadError::FileWriteFailed {
                    path: output_path.clone(),
                    source: e,
                })?;

            bytes_downloaded += slice.len() as u64;

            reporter.report(ProgressEvent::DownloadProgress {
                episode_number,
                bytes_downloaded,
                total_bytes: response.content_length,
            });
        }
    }

    file.flush()
        .await
        .map_err(|e| DownloadError::FileWriteFailed {
            path: output_path.clone(),
            source: e,
        })?;
    drop(file);

    target.ledger.append(target.feed, &episode.guid)?;

    reporter.report(ProgressEvent::DownloadCompleted {
        episode_number,
        episode_title: episode.title.clone(),
        bytes_downloaded,
    });

    Ok(DownloadOutcome::Downloaded {
        path: output_path,
        bytes: bytes_downloaded,
    })
}
