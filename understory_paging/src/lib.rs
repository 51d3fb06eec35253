// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_paging --heading-base-level=0

//! Understory Paging: incremental, size-uncertain list paging.
//!
//! This crate keeps a server-held dataset and a client-rendered virtualized
//! viewport in sync when the dataset's size may not be known up front. The
//! client asks for index ranges; the server fetches them, revises its idea of
//! how many items exist, and sends back one consistent patch per round trip.
//!
//! The core pieces are:
//!
//! - [`CountStrategy`]: decides the logical size shown to the client. The size
//!   is [`ItemCount::Exact`] (answered by the data source),
//!   [`ItemCount::Estimate`] (grows in fixed steps as the client nears the
//!   end), or [`ItemCount::Unknown`] (doubles until the end is found). A short
//!   page finalizes the probing modes to an exact count.
//! - [`fetch_page`] and the [`DataSource`] trait: range fetches from an
//!   application-owned dataset, flagging shortfall without touching the count.
//! - [`ViewportTracker`]: the requested range, the range the client holds, and
//!   the last size it was told; decides when to grow and how to clamp.
//! - [`UpdateQueue`]: buffers size changes and item set/clear operations into
//!   [`UpdateBatch`]es, with size always ahead of items and one batch in
//!   flight at a time.
//! - [`DataCommunicator`]: ties the above together for one component instance
//!   and discards results of superseded fetches.
//!
//! This crate does **not** know about widgets, transports, or threads. Hosts:
//!
//! - Forward client range requests to [`DataCommunicator::request_range`].
//! - Call [`DataCommunicator::flush`] once per turn and perform the returned
//!   fetch, synchronously or not, then report it via
//!   [`DataCommunicator::complete`] (or use [`DataCommunicator::flush_with`]).
//! - Send [`DataCommunicator::take_batch`] results to the client and pass its
//!   acknowledgements to [`DataCommunicator::confirm_update`].
//!
//! ## Minimal example
//!
//! ```rust
//! use understory_paging::{CountMode, DataCommunicator, ItemCount, PagingConfig};
//!
//! // 500 rows, but the communicator is not told how many.
//! let mut rows: Vec<u32> = (0..500).collect();
//! let config = PagingConfig::new().with_mode(CountMode::Estimate);
//! let mut communicator = DataCommunicator::new(config).unwrap();
//!
//! // The client scrolls to row 190: the estimate grows from 200 to 400.
//! communicator.request_range(190, 50);
//! communicator.flush_with(&mut rows).unwrap();
//! assert_eq!(communicator.item_count(), ItemCount::Estimate(400));
//!
//! // Scrolling past the real end finds it.
//! communicator.request_range(500, 50);
//! communicator.flush_with(&mut rows).unwrap();
//! assert_eq!(communicator.item_count(), ItemCount::Exact(500));
//!
//! let batch = communicator.take_batch().unwrap();
//! assert_eq!(batch.size(), Some(500));
//! ```
//!
//! ## Asynchronous hosts
//!
//! [`DataCommunicator::flush`] returns a [`FetchRequest`] tagged with a
//! [`Ticket`]. If the client scrolls again before the fetch finishes, the next
//! flush issues a new ticket and the old result comes back as
//! [`Completion::Stale`] without changing anything.
//!
//! ## Logging
//!
//! Growth, resolution, stale results, and batch commits are reported as
//! `tracing` debug events; ignored estimates and unknown acknowledgements as
//! warnings. No subscriber is installed.
//!
//! ## Features
//!
//! - `serde`: derives `Serialize`/`Deserialize` for [`PagingConfig`] and
//!   [`CountMode`].
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod communicator;
mod config;
mod count;
mod error;
mod fetch;
mod queue;
mod range;
mod viewport;

pub use communicator::{Completion, DataCommunicator, FetchRequest, FetchResult, Ticket};
pub use config::{CountMode, DEFAULT_PAGE_SIZE, PagingConfig};
pub use count::{CountStrategy, ItemCount};
pub use error::{ConfigError, PagingError};
pub use fetch::{DataSource, Page, Query, fetch_page, query_size};
pub use queue::{UpdateBatch, UpdateOp, UpdateQueue};
pub use range::ItemRange;
pub use viewport::ViewportTracker;
