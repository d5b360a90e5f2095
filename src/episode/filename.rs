// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use sanitize_filename::{Options, sanitize_with_options};

use crate::feed::Episode;

/// Stem used when a title sanitizes down to nothing
const FALLBACK_STEM: &str = "untitled";

const FALLBACK_EXTENSION: &str = "mp3";

/// Longest file name (stem, dot and extension) most filesystems accept
const MAX_FILENAME_BYTES: usize = 255;

const MAX_EXTENSION_BYTES: usize = 16;

fn sanitize_options() -> Options<'static> {
    Options {
        windows: true,
        truncate: false,
        replacement: "-",
    }
}

/// Cut `s` to at most `max` bytes without splitting a character
fn truncate_to_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Extract the file extension from an enclosure URL
///
/// Takes the text after the last `/`, drops any query string, then returns
/// the text after the last `.`. Returns `None` when there is no dot.
pub fn url_extension(url: &str) -> Option<&str> {
    let last_segment = url.rsplit('/').next().unwrap_or(url);
    let file_name = last_segment.split('?').next().unwrap_or(last_segment);
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}

/// Map MIME types to file extensions
fn mime_to_extension(mime: &str) -> Option<&'static str> {
    match mime.to_lowercase().as_str() {
        "audio/mpeg" | "audio/mp3" => Some("mp3"),
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => Some("m4a"),
        "audio/aac" => Some("aac"),
        "audio/ogg" => Some("ogg"),
        "audio/opus" => Some("opus"),
        "audio/wav" | "audio/x-wav" => Some("wav"),
        "audio/flac" | "audio/x-flac" => Some("flac"),
        "video/mp4" => Some("mp4"),
        _ => None,
    }
}

/// Get the media file extension for an episode
///
/// Prefers the URL, falls back to the MIME type, defaults to "mp3"
pub fn get_extension(episode: &Episode) -> String {
    if let Some(ext) = url_extension(&episode.enclosure_url) {
        let ext = sanitize_with_options(ext, sanitize_options());
        let ext = truncate_to_bytes(&ext, MAX_EXTENSION_BYTES);
        if !ext.is_empty() {
            return ext.to_string();
        }
    }

    episode
        .mime_type
        .as_deref()
        .and_then(mime_to_extension)
        .unwrap_or(FALLBACK_EXTENSION)
        .to_string()
}

/// Make a title safe to use as a file stem
///
/// Path separators and reserved characters become `-`. Titles without such
/// characters pass through unchanged.
pub fn safe_stem(title: &str) -> String {
    let stem = sanitize_with_options(title, sanitize_options());
    if stem.trim().is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem
    }
}

/// Generate the destination file name for an episode: `"<title>.<extension>"`
///
/// Long titles are cut at a character boundary so the whole name stays
/// within `MAX_FILENAME_BYTES`.
pub fn generate_filename(episode: &Episode) -> String {
    let ext = get_extension(episode);
    let stem = safe_stem(&episode.title);
    let budget = MAX_FILENAME_BYTES - 1 - ext.len();
    let stem = truncate_to_bytes(&stem, budget).trim_end_matches([' ', '.']);
    let stem = if stem.is_empty() { FALLBACK_STEM } else { stem };
    format!("{stem}.{ext}")
}
