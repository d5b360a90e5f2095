// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod download;
mod filename;
mod select;

pub use download::{CHUNK_SIZE, DownloadOutcome, DownloadTarget, download_episode};
pub use filename::{generate_filename, get_extension, safe_stem, url_extension};
pub use select::EpisodeRange;
