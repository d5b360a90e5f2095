// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::ops::Range;

/// A 1-based, inclusive range of episode positions
///
/// `end: None` means unbounded. A start past the end selects nothing; it is
/// not treated as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeRange {
    pub start: usize,
    pub end: Option<usize>,
}

impl Default for EpisodeRange {
    fn default() -> Self {
        Self {
            start: 1,
            end: None,
        }
    }
}

impl EpisodeRange {
    pub fn new(start: usize, end: Option<usize>) -> Self {
        Self { start, end }
    }

    /// Zero-based indices selected out of `total` episodes, in increasing order
    pub fn indices(&self, total: usize) -> Range<usize> {
        let first = self.start.saturating_sub(1).min(total);
        let last = self.end.map_or(total, |end| end.min(total));
        first..last.max(first)
    }

    /// Whether the zero-based index `i` falls in the range
    pub fn contains(&self, i: usize) -> bool {
        self.start.saturating_sub(1) <= i && self.end.is_none_or(|end| i < end)
    }
}
