// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Viewport tracking: what the client asked for and what it was shown.

use crate::count::ItemCount;
use crate::range::ItemRange;

/// Tracks the client's requested range, the range whose items it currently
/// holds, and the last size it was told.
#[derive(Clone, Debug)]
pub struct ViewportTracker {
    page_size: usize,
    requested: Option<ItemRange>,
    visible: ItemRange,
    communicated: Option<usize>,
}

impl ViewportTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub const fn new(page_size: usize) -> Self {
        Self {
            page_size,
            requested: None,
            visible: ItemRange::EMPTY,
            communicated: None,
        }
    }

    /// The page size used by [`should_grow`](Self::should_grow).
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Sets the page size.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size;
    }

    /// Records a range requested by the client.
    ///
    /// Returns `true` if it differs from the previous request.
    pub fn request(&mut self, range: ItemRange) -> bool {
        if self.requested == Some(range) {
            return false;
        }
        self.requested = Some(range);
        true
    }

    /// The most recently requested range.
    #[must_use]
    pub const fn requested(&self) -> Option<ItemRange> {
        self.requested
    }

    /// The range whose items the client currently holds.
    #[must_use]
    pub const fn visible(&self) -> ItemRange {
        self.visible
    }

    /// One past the last index the client currently holds.
    #[must_use]
    pub const fn visible_end(&self) -> usize {
        self.visible.end()
    }

    /// Records the range whose items were sent to the client.
    pub fn set_visible(&mut self, range: ItemRange) {
        self.visible = range;
    }

    /// The last size sent to the client.
    #[must_use]
    pub const fn communicated_size(&self) -> Option<usize> {
        self.communicated
    }

    /// Records a size sent to the client.
    ///
    /// Returns `true` if it differs from the last one.
    pub fn set_communicated_size(&mut self, size: usize) -> bool {
        if self.communicated == Some(size) {
            return false;
        }
        self.communicated = Some(size);
        true
    }

    /// Returns `true` if the count should grow before fetching `range`.
    ///
    /// That is the case when the count is not exact and `range` ends within
    /// one page of it.
    #[must_use]
    pub fn should_grow(&self, range: ItemRange, count: ItemCount) -> bool {
        !count.is_exact() && range.end().saturating_add(self.page_size) > count.size()
    }

    /// Clamps `range` so it never reaches past an exact count.
    ///
    /// Estimated counts are still being probed, so ranges past them are left
    /// alone.
    #[must_use]
    pub fn clamp_range(&self, range: ItemRange, count: ItemCount) -> ItemRange {
        match count {
            ItemCount::Exact(n) => range.clamp_to(n),
            _ => range,
        }
    }

    /// Forgets what the client holds and what size it was told.
    ///
    /// The requested range is kept: it is the client's scroll position, and
    /// the client expects it to be filled again.
    pub fn reset(&mut self) {
        self.visible = ItemRange::EMPTY;
        self.communicated = None;
    }
}
