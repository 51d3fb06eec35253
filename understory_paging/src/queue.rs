// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Update queue: batches size and item operations into one patch per round trip.
//!
//! The client must never see items set before its array was resized to hold
//! them, so a batch always carries its size change ahead of any item
//! operation. Only one batch is in flight at a time; operations enqueued while
//! waiting for an acknowledgement accumulate into the next batch.
//!
//! Hoisting the size means a shrink inside an open batch would leave earlier
//! operations pointing past the new end. A shrink therefore clips what is
//! already buffered, and if the size grows again before the batch is sent, the
//! batch starts by clearing everything from the lowest size it passed through.

use alloc::vec::Vec;

use smallvec::SmallVec;

/// A single item operation inside an [`UpdateBatch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpdateOp<T> {
    /// Replace items starting at `start`.
    Set {
        /// Index of the first item.
        start: usize,
        /// The items, in index order.
        items: Vec<T>,
    },
    /// Drop items the client no longer needs.
    Clear {
        /// Index of the first cleared item.
        start: usize,
        /// Number of cleared items.
        len: usize,
    },
}

impl<T> UpdateOp<T> {
    /// Drops the part of the operation at or past `size`.
    ///
    /// Returns `false` if nothing is left.
    fn clip_to(&mut self, size: usize) -> bool {
        let room = |start: usize| size.saturating_sub(start);
        match self {
            Self::Set { start, items } => {
                items.truncate(room(*start));
                !items.is_empty()
            }
            Self::Clear { start, len } => {
                *len = (*len).min(room(*start));
                *len > 0
            }
        }
    }
}

/// Operations for one round trip, tagged with an update id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateBatch<T> {
    update_id: u64,
    size: Option<usize>,
    ops: SmallVec<[UpdateOp<T>; 4]>,
}

impl<T> UpdateBatch<T> {
    /// The id the client echoes back to acknowledge this batch.
    #[must_use]
    pub fn update_id(&self) -> u64 {
        self.update_id
    }

    /// The new dataset size, applied before [`ops`](Self::ops).
    ///
    /// No operation in the batch reaches past the size the client has once
    /// this is applied.
    #[must_use]
    pub fn size(&self) -> Option<usize> {
        self.size
    }

    /// Item operations in the order they were enqueued.
    #[must_use]
    pub fn ops(&self) -> &[UpdateOp<T>] {
        &self.ops
    }

    /// Consumes the batch, returning its item operations.
    #[must_use]
    pub fn into_ops(self) -> Vec<UpdateOp<T>> {
        self.ops.into_vec()
    }
}

/// Buffers update operations until the transport can send them.
///
/// The queue also remembers the size carried by the last batch it sent, which
/// is the size the client holds (or is about to hold).
///
/// ```rust
/// use understory_paging::{UpdateOp, UpdateQueue};
///
/// let mut queue = UpdateQueue::new();
/// queue.set(0, vec!["a", "b"]);
/// queue.update_size(2);
///
/// let batch = queue.commit().unwrap();
/// assert_eq!(batch.size(), Some(2));
/// assert_eq!(batch.ops(), &[UpdateOp::Set { start: 0, items: vec!["a", "b"] }]);
///
/// // Nothing more goes out until the client acknowledges.
/// queue.clear(0, 1);
/// assert!(queue.commit().is_none());
/// let next = queue.confirm(batch.update_id()).unwrap();
/// assert_eq!(next.ops(), &[UpdateOp::Clear { start: 0, len: 1 }]);
/// ```
#[derive(Clone, Debug)]
pub struct UpdateQueue<T> {
    size: Option<usize>,
    /// Lowest size the open batch shrank to.
    shrunk_to: Option<usize>,
    ops: SmallVec<[UpdateOp<T>; 4]>,
    in_flight: Option<u64>,
    /// Size carried by the most recent batch that set one.
    sent_size: Option<usize>,
    last_id: u64,
}

impl<T> Default for UpdateQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> UpdateQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            size: None,
            shrunk_to: None,
            ops: SmallVec::new(),
            in_flight: None,
            sent_size: None,
            last_id: 0,
        }
    }

    /// The size the client will hold once everything buffered is sent.
    #[must_use]
    pub fn client_size(&self) -> Option<usize> {
        self.size.or(self.sent_size)
    }

    /// Queues a size change. A later size change in the same batch replaces it.
    ///
    /// Shrinking clips the operations already buffered to the new size.
    pub fn update_size(&mut self, size: usize) {
        if self.client_size().is_some_and(|current| size < current) {
            self.ops.retain(|op| op.clip_to(size));
            self.shrunk_to = Some(self.shrunk_to.map_or(size, |lowest| lowest.min(size)));
        }
        self.size = Some(size);
    }

    /// Queues items to set starting at `start`.
    pub fn set(&mut self, start: usize, items: Vec<T>) {
        if !items.is_empty() {
            self.ops.push(UpdateOp::Set { start, items });
        }
    }

    /// Queues `len` items to clear starting at `start`.
    pub fn clear(&mut self, start: usize, len: usize) {
        if len > 0 {
            self.ops.push(UpdateOp::Clear { start, len });
        }
    }

    /// Queues a clear of every index the client may hold.
    pub fn clear_all(&mut self) {
        if let Some(size) = self.client_size() {
            self.clear(0, size);
        }
    }

    /// Returns `true` if nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size.is_none() && self.ops.is_empty()
    }

    /// The id of the batch awaiting acknowledgement, if any.
    #[must_use]
    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    /// Takes the buffered operations as the next batch.
    ///
    /// Returns `None` while a batch is in flight or when nothing is buffered.
    /// Operations past the client's size are dropped.
    pub fn commit(&mut self) -> Option<UpdateBatch<T>> {
        if self.in_flight.is_some() || self.is_empty() {
            return None;
        }
        let size = self.size.take();
        let mut ops = core::mem::take(&mut self.ops);
        if let Some(limit) = size.or(self.sent_size) {
            ops.retain(|op| op.clip_to(limit));
        }
        if let (Some(lowest), Some(size)) = (self.shrunk_to.take(), size)
            && size > lowest
        {
            ops.insert(
                0,
                UpdateOp::Clear {
                    start: lowest,
                    len: size - lowest,
                },
            );
        }
        if size.is_none() && ops.is_empty() {
            return None;
        }
        self.last_id += 1;
        self.sent_size = size.or(self.sent_size);
        let batch = UpdateBatch {
            update_id: self.last_id,
            size,
            ops,
        };
        self.in_flight = Some(batch.update_id);
        tracing::debug!(
            update_id = batch.update_id,
            size = ?batch.size,
            ops = batch.ops.len(),
            "committed update batch"
        );
        Some(batch)
    }

    /// Acknowledges the in-flight batch and commits whatever was buffered since.
    ///
    /// Acknowledgements for other ids are ignored.
    pub fn confirm(&mut self, update_id: u64) -> Option<UpdateBatch<T>> {
        if self.in_flight != Some(update_id) {
            tracing::warn!(
                update_id,
                in_flight = ?self.in_flight,
                "ignoring acknowledgement for an unknown update"
            );
            return None;
        }
        self.in_flight = None;
        self.commit()
    }

    /// Drops buffered operations.
    ///
    /// A batch already in flight has reached the transport, so it stays in
    /// flight and its acknowledgement is still accepted; nothing newer goes out
    /// before it. The client's size is remembered for
    /// [`clear_all`](Self::clear_all). Update ids keep increasing.
    pub fn reset(&mut self) {
        self.size = None;
        self.shrunk_to = None;
        self.ops.clear();
    }
}
