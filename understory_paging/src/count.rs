// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Item count strategy: exact, estimated, or unknown dataset sizes.
//!
//! [`CountStrategy`] owns the logical size presented to the client. In the
//! probing modes ([`CountMode::Estimate`] and [`CountMode::Unknown`]) it grows a
//! working size as the client scrolls towards the end, and finalizes to an
//! exact count once a fetch comes back short.

use crate::config::{CountMode, PagingConfig};
use crate::error::ConfigError;
use crate::range::ItemRange;

/// The logical size of a dataset as currently known.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ItemCount {
    /// The size is known.
    Exact(usize),
    /// A working guess that may still grow.
    Estimate(usize),
    /// Nothing is known yet; `assumed` is the working size shown to the client
    /// until the end of data is found.
    Unknown {
        /// Working size communicated to the client.
        assumed: usize,
    },
}

impl ItemCount {
    /// The size the client should currently be shown.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::Exact(n) | Self::Estimate(n) | Self::Unknown { assumed: n } => n,
        }
    }

    /// Returns `true` if the count is exact.
    #[must_use]
    pub const fn is_exact(self) -> bool {
        matches!(self, Self::Exact(_))
    }

    /// Returns the exact size, if known.
    #[must_use]
    pub const fn exact(self) -> Option<usize> {
        match self {
            Self::Exact(n) => Some(n),
            _ => None,
        }
    }
}

/// Decides the logical dataset size from the configured mode and probe results.
///
/// Once the count is exact, growth, estimate changes, and probe feedback no
/// longer touch it. Only [`set_mode`](Self::set_mode) and [`reset`](Self::reset)
/// leave an exact count.
///
/// ```rust
/// use understory_paging::{CountStrategy, ItemCount, ItemRange, PagingConfig};
///
/// let mut strategy = CountStrategy::new(&PagingConfig::new());
/// assert_eq!(strategy.count(), ItemCount::Estimate(200));
///
/// // The client asks for rows close to the end of the estimate.
/// assert!(strategy.grow_for(ItemRange::new(190, 50), 50));
/// assert_eq!(strategy.count(), ItemCount::Estimate(400));
///
/// // A short page reveals the real end of data.
/// assert!(strategy.observe(ItemRange::new(450, 50), 20));
/// assert_eq!(strategy.count(), ItemCount::Exact(470));
/// ```
#[derive(Clone, Debug)]
pub struct CountStrategy {
    mode: CountMode,
    size: usize,
    /// A probing mode found the end of data.
    resolved: bool,
    estimate: usize,
    increase: usize,
}

impl CountStrategy {
    /// Creates a strategy in the configured mode.
    #[must_use]
    pub fn new(config: &PagingConfig) -> Self {
        let mut strategy = Self {
            mode: config.mode,
            size: 0,
            resolved: false,
            estimate: config.estimate(),
            increase: config.estimate_increase().max(1),
        };
        strategy.reset();
        strategy
    }

    /// The configured mode.
    #[must_use]
    pub fn mode(&self) -> CountMode {
        self.mode
    }

    /// The current count.
    #[must_use]
    pub fn count(&self) -> ItemCount {
        if self.is_exact() {
            return ItemCount::Exact(self.size);
        }
        match self.mode {
            CountMode::Estimate => ItemCount::Estimate(self.size),
            _ => ItemCount::Unknown { assumed: self.size },
        }
    }

    /// The size communicated to the client.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns `true` if the count is exact, either by mode or by resolution.
    #[must_use]
    pub fn is_exact(&self) -> bool {
        self.resolved || self.mode == CountMode::Exact
    }

    /// The estimate a reset returns to in the probing modes.
    #[must_use]
    pub fn estimate(&self) -> usize {
        self.estimate
    }

    /// The growth step used by [`CountMode::Estimate`].
    #[must_use]
    pub fn estimate_increase(&self) -> usize {
        self.increase
    }

    /// Grows the working size so that one more page fits after `range`.
    ///
    /// Does nothing when the count is exact or `range.end() + page_size`
    /// already fits. [`CountMode::Estimate`] grows in fixed increments;
    /// [`CountMode::Unknown`] doubles (by at least one increment).
    ///
    /// Returns `true` if the size changed.
    pub fn grow_for(&mut self, range: ItemRange, page_size: usize) -> bool {
        if self.is_exact() {
            return false;
        }
        let wanted = range.end().saturating_add(page_size);
        if wanted <= self.size {
            return false;
        }
        let before = self.size;
        match self.mode {
            CountMode::Unknown => {
                while self.size < wanted {
                    self.size = self.size.saturating_add(self.size.max(self.increase));
                }
            }
            _ => {
                let steps = (wanted - self.size).div_ceil(self.increase);
                self.size = self
                    .size
                    .saturating_add(steps.saturating_mul(self.increase));
            }
        }
        tracing::debug!(from = before, to = self.size, "grew item count estimate");
        true
    }

    /// Feeds back how many items a fetch of `range` returned.
    ///
    /// In a probing mode, a short result resolves the count to
    /// `range.start + returned`. An empty result past index 0 only proves the
    /// end lies at or before `range.start`, so it resolves nothing; callers
    /// probe backwards and finish with [`resolve_exact`](Self::resolve_exact).
    ///
    /// Returns `true` if the count became exact.
    pub fn observe(&mut self, range: ItemRange, returned: usize) -> bool {
        if self.is_exact() || returned >= range.len {
            return false;
        }
        if returned == 0 && range.start > 0 {
            return false;
        }
        self.resolve_exact(range.start + returned);
        true
    }

    /// Makes the count exact.
    ///
    /// In [`CountMode::Exact`] this records the data source's answer; in the
    /// probing modes it finalizes the end of data.
    pub fn resolve_exact(&mut self, size: usize) {
        if self.mode.is_probing() && !self.resolved {
            tracing::debug!(size, "resolved item count to exact");
        }
        self.resolved = self.mode.is_probing();
        self.size = size;
    }

    /// Replaces the estimate, never going below `floor`.
    ///
    /// `floor` is the end of the range the client currently shows; a lower
    /// estimate would reference items that are on screen as absent. Ignored
    /// once the count is exact.
    ///
    /// Returns `true` if the size changed.
    pub fn set_estimate(&mut self, estimate: usize, floor: usize) -> bool {
        if self.is_exact() {
            tracing::warn!(
                estimate,
                size = self.size,
                "ignoring item count estimate for an exact count"
            );
            return false;
        }
        self.estimate = estimate;
        let size = estimate.max(floor);
        if size > estimate {
            tracing::debug!(estimate, floor, "raised estimate to the visible end");
        }
        let changed = size != self.size;
        self.size = size;
        changed
    }

    /// Sets the growth step.
    pub fn set_estimate_increase(&mut self, increase: usize) -> Result<(), ConfigError> {
        if increase == 0 {
            return Err(ConfigError::ZeroEstimateIncrease);
        }
        self.increase = increase;
        Ok(())
    }

    /// Switches mode explicitly, discarding any resolution.
    pub fn set_mode(&mut self, mode: CountMode) {
        self.mode = mode;
        self.reset();
    }

    /// Returns to the initial state of the current mode.
    ///
    /// [`CountMode::Exact`] starts at zero until the data source answers.
    pub fn reset(&mut self) {
        self.resolved = false;
        self.size = if self.mode.is_probing() {
            self.estimate
        } else {
            0
        };
    }
}
