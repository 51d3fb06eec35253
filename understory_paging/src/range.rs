// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Half-open index ranges over a logical dataset.

use core::ops::Range;

/// A contiguous window of item indices, `[start, start + len)`.
///
/// Unlike [`Range<usize>`], `ItemRange` is `Copy` and is stored as a start plus
/// a length, which is how viewports request data.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ItemRange {
    /// First index in the range.
    pub start: usize,
    /// Number of indices in the range.
    pub len: usize,
}

impl ItemRange {
    /// The empty range at index 0.
    pub const EMPTY: Self = Self { start: 0, len: 0 };

    /// Creates a range from a start index and a length.
    #[must_use]
    pub const fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// Creates a range from `start` to `end` (exclusive).
    ///
    /// If `end < start`, the range is empty and starts at `start`.
    #[must_use]
    pub const fn between(start: usize, end: usize) -> Self {
        Self {
            start,
            len: end.saturating_sub(start),
        }
    }

    /// One past the last index in the range.
    #[must_use]
    pub const fn end(self) -> usize {
        self.start.saturating_add(self.len)
    }

    /// Returns `true` if the range covers no indices.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    /// Returns `true` if `index` lies inside the range.
    #[must_use]
    pub const fn contains(self, index: usize) -> bool {
        index >= self.start && index < self.end()
    }

    /// Returns the overlap of two ranges (empty if they are disjoint).
    #[must_use]
    pub fn intersect(self, other: Self) -> Self {
        let start = self.start.max(other.start);
        let end = self.end().min(other.end());
        if end <= start {
            Self::new(start.min(end), 0)
        } else {
            Self::between(start, end)
        }
    }

    /// Truncates the range so that it does not extend past `size`.
    #[must_use]
    pub fn clamp_to(self, size: usize) -> Self {
        let start = self.start.min(size);
        Self::between(start, self.end().min(size))
    }

    /// Returns the parts of `self` not covered by `other`, in ascending order.
    ///
    /// At most two pieces are produced: one before `other` and one after it.
    /// Empty pieces are `None`.
    #[must_use]
    pub fn difference(self, other: Self) -> (Option<Self>, Option<Self>) {
        if self.is_empty() {
            return (None, None);
        }
        let overlap = self.intersect(other);
        if overlap.is_empty() {
            return (Some(self), None);
        }
        let before = Self::between(self.start, overlap.start);
        let after = Self::between(overlap.end(), self.end());
        (
            (!before.is_empty()).then_some(before),
            (!after.is_empty()).then_some(after),
        )
    }

    /// Converts to a standard library range.
    #[must_use]
    pub const fn to_range(self) -> Range<usize> {
        self.start..self.end()
    }
}

impl From<Range<usize>> for ItemRange {
    fn from(range: Range<usize>) -> Self {
        Self::between(range.start, range.end)
    }
}

impl From<ItemRange> for Range<usize> {
    fn from(range: ItemRange) -> Self {
        range.to_range()
    }
}
