// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Page fetching from an application-owned data source.

use alloc::vec::Vec;
use core::convert::Infallible;

use crate::error::PagingError;
use crate::range::ItemRange;

/// An offset/limit window passed to a [`DataSource`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Query {
    /// Index of the first requested item.
    pub offset: usize,
    /// Maximum number of items to return.
    pub limit: usize,
}

impl Query {
    /// A query covering the whole dataset, used for size queries.
    pub const UNBOUNDED: Self = Self {
        offset: 0,
        limit: usize::MAX,
    };

    /// The query as an item range.
    #[must_use]
    pub const fn range(&self) -> ItemRange {
        ItemRange::new(self.offset, self.limit)
    }
}

impl From<ItemRange> for Query {
    fn from(range: ItemRange) -> Self {
        Self {
            offset: range.start,
            limit: range.len,
        }
    }
}

/// The application's dataset, exposed by range.
///
/// Implementations may return fewer items than `query.limit` when the end of
/// data is reached; they must never return more.
pub trait DataSource {
    /// The item type.
    type Item;
    /// The failure type of the backing store.
    type Error;

    /// Returns the items in `[query.offset, query.offset + query.limit)`.
    fn fetch(&mut self, query: &Query) -> Result<Vec<Self::Item>, Self::Error>;

    /// Returns the exact number of items matching `query`, if the source can
    /// count them.
    ///
    /// Required for [`CountMode::Exact`](crate::CountMode::Exact). The default
    /// implementation cannot count.
    fn size(&mut self, _query: &Query) -> Option<Result<usize, Self::Error>> {
        None
    }
}

impl<T: Clone> DataSource for Vec<T> {
    type Item = T;
    type Error = Infallible;

    fn fetch(&mut self, query: &Query) -> Result<Vec<T>, Infallible> {
        let range = query.range().clamp_to(self.len());
        Ok(self[range.to_range()].to_vec())
    }

    fn size(&mut self, _query: &Query) -> Option<Result<usize, Infallible>> {
        Some(Ok(self.len()))
    }
}

/// Items fetched for a requested range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
    /// The range that was requested.
    pub range: ItemRange,
    /// The items returned, starting at `range.start`.
    pub items: Vec<T>,
    /// Fewer items came back than were requested, so the end of data may
    /// lie inside `range`.
    pub shortfall: bool,
}

/// Fetches `range` from `source`.
///
/// The item count is not touched here; callers feed the result to a
/// [`CountStrategy`](crate::CountStrategy). An empty range is answered without
/// calling the source.
pub fn fetch_page<S: DataSource>(
    source: &mut S,
    range: ItemRange,
) -> Result<Page<S::Item>, PagingError<S::Error>> {
    if range.is_empty() {
        return Ok(Page {
            range,
            items: Vec::new(),
            shortfall: false,
        });
    }
    let items = source
        .fetch(&Query::from(range))
        .map_err(PagingError::Source)?;
    if items.len() > range.len {
        return Err(PagingError::Overfetch {
            requested: range.len,
            returned: items.len(),
        });
    }
    Ok(Page {
        range,
        shortfall: items.len() < range.len,
        items,
    })
}

/// Asks `source` for the exact size of the dataset.
pub fn query_size<S: DataSource>(source: &mut S) -> Result<usize, PagingError<S::Error>> {
    match source.size(&Query::UNBOUNDED) {
        Some(Ok(size)) => Ok(size),
        Some(Err(err)) => Err(PagingError::Source(err)),
        None => Err(PagingError::MissingSize),
    }
}
