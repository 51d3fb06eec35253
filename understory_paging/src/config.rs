// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paging configuration.

use crate::error::ConfigError;

/// Default number of items fetched per page.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Multiple of the page size used for the default estimate and its increase.
const DEFAULT_ESTIMATE_PAGES: usize = 4;

/// How the logical size of the dataset is determined.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CountMode {
    /// The data source answers a size query and that answer is trusted as-is.
    Exact,
    /// Start from an application-supplied estimate and grow it by a fixed
    /// increment while the client scrolls towards the end.
    #[default]
    Estimate,
    /// Nothing is known up front; the working size doubles as the client
    /// scrolls until the end of data is found.
    Unknown,
}

impl CountMode {
    /// Returns `true` for the modes that probe for the end of data.
    #[must_use]
    pub const fn is_probing(self) -> bool {
        !matches!(self, Self::Exact)
    }
}

/// Tunables for a [`DataCommunicator`](crate::DataCommunicator).
///
/// Estimate values left as `None` default to four pages.
///
/// ```rust
/// use understory_paging::{CountMode, PagingConfig};
///
/// let config = PagingConfig::new()
///     .with_page_size(25)
///     .with_mode(CountMode::Unknown);
/// assert_eq!(config.estimate(), 100);
/// assert_eq!(config.estimate_increase(), 100);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PagingConfig {
    /// Number of items fetched per page.
    pub page_size: usize,
    /// How the dataset size is determined.
    pub mode: CountMode,
    /// Initial estimate for the probing modes.
    pub estimate: Option<usize>,
    /// Growth step for [`CountMode::Estimate`].
    pub estimate_increase: Option<usize>,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PagingConfig {
    /// Creates the default configuration: 50 items per page, estimated count.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            mode: CountMode::Estimate,
            estimate: None,
            estimate_increase: None,
        }
    }

    /// Sets the page size.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the count mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: CountMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the initial estimate.
    #[must_use]
    pub const fn with_estimate(mut self, estimate: usize) -> Self {
        self.estimate = Some(estimate);
        self
    }

    /// Sets the estimate growth step.
    #[must_use]
    pub const fn with_estimate_increase(mut self, increase: usize) -> Self {
        self.estimate_increase = Some(increase);
        self
    }

    /// The effective initial estimate.
    #[must_use]
    pub fn estimate(&self) -> usize {
        self.estimate
            .unwrap_or(self.page_size.saturating_mul(DEFAULT_ESTIMATE_PAGES))
    }

    /// The effective estimate growth step.
    #[must_use]
    pub fn estimate_increase(&self) -> usize {
        self.estimate_increase
            .unwrap_or(self.page_size.saturating_mul(DEFAULT_ESTIMATE_PAGES))
    }

    /// Checks that the configuration can drive paging.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if self.estimate_increase() == 0 {
            return Err(ConfigError::ZeroEstimateIncrease);
        }
        Ok(())
    }
}
