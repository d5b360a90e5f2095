// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod fetch;
mod parse;

pub use fetch::{RetryPolicy, fetch_feed, fetch_feed_with_retry};
pub use parse::{
    Episode, FeedDocument, clean_title, extract_enclosure_urls, extract_titles_and_guids,
    parse_episodes, parse_feed,
};
