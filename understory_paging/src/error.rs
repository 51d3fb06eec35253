// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use thiserror::Error;

/// Errors surfaced while fetching or applying a page.
///
/// None of these leave partial state behind: when an operation returns an
/// error, the item count, viewport, and update queue are exactly as they were
/// before the call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PagingError<E> {
    /// The backing data source failed.
    #[error("data source failed: {0}")]
    Source(E),
    /// The data source returned more items than the query asked for.
    #[error("data source returned {returned} items for a query limited to {requested}")]
    Overfetch {
        /// The query limit.
        requested: usize,
        /// The number of items actually returned.
        returned: usize,
    },
    /// The count mode is exact but the data source has no size query.
    #[error("exact item count requested but the data source does not provide a size")]
    MissingSize,
}

/// Invalid [`PagingConfig`](crate::PagingConfig) values.
#[derive(Copy, Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Page size must be at least one item.
    #[error("page size must be greater than zero")]
    ZeroPageSize,
    /// Estimate growth must advance by at least one item.
    #[error("item count estimate increase must be greater than zero")]
    ZeroEstimateIncrease,
}
