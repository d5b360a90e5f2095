// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::error::FeedError;

/// A parsed feed document
pub type FeedDocument = rss::Channel;

/// One downloadable episode, built from a single `<item>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Episode {
    /// Display title with the colon and `&amp;` substitutions applied
    pub title: String,
    /// Trimmed guid text; the dedup key within one feed
    pub guid: String,
    /// Location of the media resource
    pub enclosure_url: String,
    /// Declared MIME type of the enclosure, if any
    pub mime_type: Option<String>,
}

/// Parse RSS feed XML bytes into a document
pub fn parse_feed(xml_bytes: &[u8]) -> Result<FeedDocument, FeedError> {
    Ok(rss::Channel::read_from(xml_bytes)?)
}

/// Apply the display substitutions to a raw title: colon becomes " -",
/// a literal `&amp;` becomes `&`.
pub fn clean_title(raw: &str) -> String {
    raw.trim().replace(':', " -").replace("&amp;", "&")
}

/// Collect the `url` attribute of every enclosure, in document order
pub fn extract_enclosure_urls(doc: &FeedDocument) -> Vec<String> {
    doc.items()
        .iter()
        .filter_map(|item| item.enclosure())
        .map(|enclosure| enclosure.url().to_string())
        .collect()
}

/// Collect every item title (cleaned) and every item guid (trimmed), each in
/// document order. The two lists are independent scans and need not align.
pub fn extract_titles_and_guids(doc: &FeedDocument) -> (Vec<String>, Vec<String>) {
    let titles = doc
        .items()
        .iter()
        .filter_map(|item| item.title())
        .map(clean_title)
        .collect();

    let guids = doc
        .items()
        .iter()
        .filter_map(|item| item.guid())
        .map(|guid| guid.value().trim().to_string())
        .collect();

    (titles, guids)
}

/// Build one episode per item, in document order.
///
/// Items missing a guid or enclosure are skipped with a warning, so a
/// malformed item never shifts the fields of its neighbours. A missing or
/// empty title is kept as `""`; the file name falls back to a placeholder.
pub fn parse_episodes(doc: &FeedDocument) -> Vec<Episode> {
    doc.items()
        .iter()
        .enumerate()
        .filter_map(|(position, item)| match parse_episode(item) {
            Ok(episode) => Some(episode),
            Err(missing) => {
                tracing::warn!(
                    "Skipping feed item {} ({}): no {}",
                    position + 1,
                    item.title().unwrap_or("untitled").trim(),
                    missing
                );
                None
            }
        })
        .collect()
}

fn parse_episode(item: &rss::Item) -> Result<Episode, &'static str> {
    // The rss reader yields no title for an empty element; such items are
    // still downloaded, under a placeholder file name.
    let title = item.title().map(clean_title).unwrap_or_default();

    let guid = item
        .guid()
        .map(|g| g.value().trim().to_string())
        .filter(|g| !g.is_empty())
        .ok_or("guid")?;

    let enclosure = item
        .enclosure()
        .filter(|e| !e.url().trim().is_empty())
        .ok_or("enclosure")?;

    Ok(Episode {
        title,
        guid,
        enclosure_url: enclosure.url().trim().to_string(),
        mime_type: Some(enclosure.mime_type().to_string()).filter(|s| !s.is_empty()),
    })
}
