// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Data communicator: drives paging for one component instance.

use alloc::vec::Vec;

use crate::config::{CountMode, PagingConfig};
use crate::count::{CountStrategy, ItemCount};
use crate::error::{ConfigError, PagingError};
use crate::fetch::{DataSource, Query, fetch_page, query_size};
use crate::queue::{UpdateBatch, UpdateQueue};
use crate::range::ItemRange;
use crate::viewport::ViewportTracker;

/// Identifies an issued fetch.
///
/// Tickets increase monotonically; only the most recently issued one is
/// accepted by [`DataCommunicator::complete`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    /// The raw generation number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// A fetch the host should perform and report back via
/// [`DataCommunicator::complete`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    /// Ticket to hand back with the result.
    pub ticket: Ticket,
    /// Items to fetch.
    pub range: ItemRange,
    /// The exact size must be queried too (and reported in
    /// [`FetchResult::size`]). When set, hosts may clamp `range` to that size
    /// before fetching.
    pub query_size: bool,
}

impl FetchRequest {
    /// The range as a data source query.
    #[must_use]
    pub fn query(&self) -> Query {
        Query::from(self.range)
    }
}

/// What a host reports for a completed [`FetchRequest`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchResult<T> {
    /// Items starting at the requested range's start.
    pub items: Vec<T>,
    /// Exact dataset size, when the request asked for it.
    pub size: Option<usize>,
}

impl<T> FetchResult<T> {
    /// A result carrying items only.
    #[must_use]
    pub fn items(items: Vec<T>) -> Self {
        Self { items, size: None }
    }

    /// A result carrying items and the exact dataset size.
    #[must_use]
    pub fn with_size(items: Vec<T>, size: usize) -> Self {
        Self {
            items,
            size: Some(size),
        }
    }
}

/// Outcome of [`DataCommunicator::complete`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Completion {
    /// The result was applied; the client now holds `range`.
    Applied {
        /// The range whose items the client holds.
        range: ItemRange,
    },
    /// The ticket was superseded; nothing changed.
    Stale,
    /// The fetched range lies past the end of data. Fetch this request next to
    /// find where the data ends.
    Probe(FetchRequest),
}

#[derive(Copy, Clone, Debug)]
enum FetchKind {
    Page,
    /// Stepping back from an empty page to locate the end of data.
    Probe,
}

#[derive(Copy, Clone, Debug)]
struct Pending {
    request: FetchRequest,
    kind: FetchKind,
}

/// Sans-IO controller pairing a server-held dataset with a client viewport.
///
/// One instance serves one component and is driven from a single thread:
///
/// 1. Inbound [`request_range`](Self::request_range) calls record what the
///    client wants to see. They are deferred; several requests in one turn
///    collapse into the last one.
/// 2. Once per turn, [`flush`](Self::flush) returns the fetch to perform.
///    Synchronous hosts can use [`flush_with`](Self::flush_with) instead.
/// 3. [`complete`](Self::complete) applies a fetch result to the item count
///    (growing it if the client nears its end) and the update queue together,
///    discarding superseded results.
/// 4. [`take_batch`](Self::take_batch) hands the next patch to the transport;
///    [`confirm_update`](Self::confirm_update) acknowledges it.
///
/// ```rust
/// use understory_paging::{DataCommunicator, ItemCount, PagingConfig, UpdateOp};
///
/// let mut rows: Vec<u32> = (0..470).collect();
/// let mut communicator = DataCommunicator::new(PagingConfig::new()).unwrap();
///
/// communicator.request_range(0, 50);
/// communicator.flush_with(&mut rows).unwrap();
/// let batch = communicator.take_batch().unwrap();
/// assert_eq!(batch.size(), Some(200));
/// assert!(matches!(&batch.ops()[0], UpdateOp::Set { start: 0, items } if items.len() == 50));
///
/// // Jumping near the end grows the estimate, then a short page pins it.
/// communicator.request_range(450, 50);
/// communicator.flush_with(&mut rows).unwrap();
/// assert_eq!(communicator.item_count(), ItemCount::Exact(470));
/// ```
#[derive(Clone, Debug)]
pub struct DataCommunicator<T> {
    config: PagingConfig,
    strategy: CountStrategy,
    viewport: ViewportTracker,
    queue: UpdateQueue<T>,
    last_ticket: u64,
    pending: Option<Pending>,
    /// A flush has work to do.
    dirty: bool,
    /// The next applied page replaces everything the client holds.
    resend: bool,
    /// The exact size must be queried again.
    size_stale: bool,
}

impl<T> DataCommunicator<T> {
    /// Creates a communicator for a freshly attached data source.
    pub fn new(config: PagingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            strategy: CountStrategy::new(&config),
            viewport: ViewportTracker::new(config.page_size),
            queue: UpdateQueue::new(),
            last_ticket: 0,
            pending: None,
            dirty: true,
            resend: false,
            size_stale: config.mode == CountMode::Exact,
        })
    }

    /// The current configuration, including changes made through setters.
    #[must_use]
    pub fn config(&self) -> &PagingConfig {
        &self.config
    }

    /// The current item count.
    #[must_use]
    pub fn item_count(&self) -> ItemCount {
        self.strategy.count()
    }

    /// The size the client is being shown.
    #[must_use]
    pub fn size(&self) -> usize {
        self.strategy.size()
    }

    /// The last range requested by the client.
    #[must_use]
    pub fn requested_range(&self) -> Option<ItemRange> {
        self.viewport.requested()
    }

    /// The range whose items the client holds.
    #[must_use]
    pub fn visible_range(&self) -> ItemRange {
        self.viewport.visible()
    }

    /// The fetch awaiting completion, if any.
    #[must_use]
    pub fn pending_fetch(&self) -> Option<FetchRequest> {
        self.pending.map(|p| p.request)
    }

    /// Records the range the client wants to display.
    ///
    /// Nothing is fetched until the next [`flush`](Self::flush).
    pub fn request_range(&mut self, start: usize, len: usize) {
        if self.viewport.request(ItemRange::new(start, len)) {
            self.dirty = true;
        }
    }

    /// Runs the deferred work for this turn.
    ///
    /// Clamps the requested range to an exact count and returns the fetch the
    /// host should perform. Growth of the count and size changes travel with
    /// the items once the fetch completes; when there is nothing to fetch they
    /// are applied right away. A request issued here supersedes any fetch
    /// still in flight.
    ///
    /// Returns `None` when there is nothing to fetch.
    pub fn flush(&mut self) -> Option<FetchRequest> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        let requested = self.viewport.requested().unwrap_or(ItemRange::EMPTY);

        if self.size_stale {
            return Some(self.issue(requested, true, FetchKind::Page));
        }

        let range = self
            .viewport
            .clamp_range(requested, self.strategy.count());
        if range.is_empty() {
            self.pending = None;
            self.grow_towards(range);
            self.apply(range, Vec::new());
            return None;
        }
        Some(self.issue(range, false, FetchKind::Page))
    }

    /// Applies the result of a fetch issued by [`flush`](Self::flush).
    ///
    /// Results for superseded tickets are ignored. On error nothing is
    /// applied, the count included, and the fetch is dropped; the next `flush`
    /// reissues it, so retrying stays the host's decision.
    pub fn complete<E>(
        &mut self,
        ticket: Ticket,
        result: Result<FetchResult<T>, E>,
    ) -> Result<Completion, PagingError<E>> {
        let Some(pending) = self.pending.filter(|p| p.request.ticket == ticket) else {
            tracing::debug!(ticket = ticket.get(), "discarding stale fetch result");
            return Ok(Completion::Stale);
        };
        let fetched = match result {
            Ok(fetched) => fetched,
            Err(err) => {
                self.invalidate();
                return Err(PagingError::Source(err));
            }
        };
        let request = pending.request;
        if fetched.items.len() > request.range.len {
            self.invalidate();
            return Err(PagingError::Overfetch {
                requested: request.range.len,
                returned: fetched.items.len(),
            });
        }
        if request.query_size && fetched.size.is_none() {
            self.invalidate();
            return Err(PagingError::MissingSize);
        }
        self.pending = None;

        let FetchResult { mut items, size } = fetched;
        match pending.kind {
            FetchKind::Page => {
                if let (true, Some(size)) = (request.query_size, size) {
                    self.strategy.resolve_exact(size);
                    self.size_stale = false;
                }
                let range = self
                    .viewport
                    .clamp_range(request.range, self.strategy.count());
                items.truncate(range.len);
                let returned = items.len();
                if returned == 0 && range.start > 0 && !self.strategy.is_exact() {
                    return Ok(Completion::Probe(self.issue_probe(range.start)));
                }
                self.grow_towards(range);
                self.strategy.observe(range, returned);
                let applied = ItemRange::new(range.start, returned);
                self.apply(applied, items);
                Ok(Completion::Applied { range: applied })
            }
            FetchKind::Probe => {
                let probe = request.range;
                let returned = items.len();
                if returned == 0 && probe.start > 0 {
                    return Ok(Completion::Probe(self.issue_probe(probe.start)));
                }
                // Everything from `probe.end()` on came back empty before, so a
                // full probe page still pins the end.
                self.strategy.resolve_exact(probe.start + returned);
                let applied = ItemRange::new(probe.start, returned);
                self.apply(applied, items);
                Ok(Completion::Applied { range: applied })
            }
        }
    }

    /// Flushes and fetches synchronously from `source` until settled.
    pub fn flush_with<S>(&mut self, source: &mut S) -> Result<(), PagingError<S::Error>>
    where
        S: DataSource<Item = T>,
    {
        let Some(mut request) = self.flush() else {
            return Ok(());
        };
        loop {
            let fetched = match Self::fetch_sync(source, &request) {
                Ok(fetched) => fetched,
                Err(err) => {
                    self.invalidate();
                    return Err(err);
                }
            };
            match self.complete(request.ticket, Ok(fetched)) {
                Ok(Completion::Probe(next)) => request = next,
                Ok(Completion::Applied { .. } | Completion::Stale) => return Ok(()),
                Err(err) => return Err(err),
            }
        }
    }

    /// Takes the next update batch for the transport, if one can be sent.
    pub fn take_batch(&mut self) -> Option<UpdateBatch<T>> {
        self.queue.commit()
    }

    /// Acknowledges a batch and returns the next one, if anything is buffered.
    pub fn confirm_update(&mut self, update_id: u64) -> Option<UpdateBatch<T>> {
        self.queue.confirm(update_id)
    }

    /// Changes the page size.
    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), ConfigError> {
        let config = self.config.with_page_size(page_size);
        config.validate()?;
        self.strategy
            .set_estimate_increase(config.estimate_increase())?;
        self.config = config;
        self.viewport.set_page_size(page_size);
        self.invalidate();
        Ok(())
    }

    /// Replaces the item count estimate.
    ///
    /// Ignored once the count is exact. The estimate never drops below the
    /// end of the range the client currently holds.
    pub fn set_item_count_estimate(&mut self, estimate: usize) {
        let exact = self.strategy.is_exact();
        let changed = self
            .strategy
            .set_estimate(estimate, self.viewport.visible_end());
        if !exact {
            self.config.estimate = Some(estimate);
        }
        if changed {
            self.invalidate();
        }
    }

    /// Replaces the step by which an estimate grows.
    pub fn set_item_count_estimate_increase(
        &mut self,
        increase: usize,
    ) -> Result<(), ConfigError> {
        self.strategy.set_estimate_increase(increase)?;
        self.config.estimate_increase = Some(increase);
        Ok(())
    }

    /// Switches the count mode explicitly.
    ///
    /// This is the only way, besides [`reset`](Self::reset), to leave an exact
    /// count. Switching to [`CountMode::Exact`] queries the size again.
    pub fn set_mode(&mut self, mode: CountMode) {
        self.config.mode = mode;
        self.strategy.set_mode(mode);
        self.size_stale = mode == CountMode::Exact;
        self.invalidate();
    }

    /// Re-fetches the visible range and sends all of its items again.
    ///
    /// The count mode is kept; an exact count taken from the data source is
    /// queried again.
    pub fn refresh_all(&mut self) {
        self.resend = true;
        self.size_stale = self.strategy.mode() == CountMode::Exact;
        self.invalidate();
    }

    /// Resets all paging state after the data source was replaced.
    ///
    /// The count returns to the configured mode, buffered updates are dropped,
    /// in-flight fetches become stale, and the client is told to clear what it
    /// holds. The requested range survives and is fetched on the next flush.
    pub fn reset(&mut self) {
        let held = self.viewport.visible();
        tracing::debug!(held = ?held, "resetting paging state");
        self.strategy.reset();
        self.viewport.reset();
        // Buffered clears are dropped with the queue, and an unacknowledged
        // batch may hold rows outside `held`.
        self.queue.reset();
        self.queue.clear_all();
        self.resend = false;
        self.size_stale = self.strategy.mode() == CountMode::Exact;
        self.invalidate();
    }

    fn fetch_sync<S>(
        source: &mut S,
        request: &FetchRequest,
    ) -> Result<FetchResult<T>, PagingError<S::Error>>
    where
        S: DataSource<Item = T>,
    {
        if request.query_size {
            let size = query_size(source)?;
            let page = fetch_page(source, request.range.clamp_to(size))?;
            Ok(FetchResult::with_size(page.items, size))
        } else {
            let page = fetch_page(source, request.range)?;
            Ok(FetchResult::items(page.items))
        }
    }

    fn issue(&mut self, range: ItemRange, query_size: bool, kind: FetchKind) -> FetchRequest {
        self.last_ticket += 1;
        let request = FetchRequest {
            ticket: Ticket(self.last_ticket),
            range,
            query_size,
        };
        if let Some(previous) = self.pending.replace(Pending { request, kind }) {
            tracing::debug!(
                superseded = previous.request.ticket.get(),
                ticket = request.ticket.get(),
                "superseding in-flight fetch"
            );
        }
        request
    }

    /// Grows the count so one more page fits after `range`.
    fn grow_towards(&mut self, range: ItemRange) {
        if self.viewport.should_grow(range, self.strategy.count()) {
            self.strategy.grow_for(range, self.viewport.page_size());
        }
    }

    /// Issues a one-page probe ending at `end`.
    fn issue_probe(&mut self, end: usize) -> FetchRequest {
        let start = end.saturating_sub(self.viewport.page_size());
        let probe = ItemRange::between(start, end);
        tracing::debug!(start = probe.start, "probing backwards for the end of data");
        self.issue(probe, false, FetchKind::Probe)
    }

    fn invalidate(&mut self) {
        self.pending = None;
        self.dirty = true;
    }

    /// Queues the size and item changes that make the client hold `applied`.
    fn apply(&mut self, applied: ItemRange, mut items: Vec<T>) {
        let size = self.strategy.size();
        if self.viewport.set_communicated_size(size) {
            self.queue.update_size(size);
        }

        let held = self.viewport.visible();
        if core::mem::take(&mut self.resend) {
            self.queue.clear(held.start, held.len);
            self.queue.set(applied.start, items);
        } else {
            let (dropped_before, dropped_after) = held.difference(applied);
            for dropped in [dropped_before, dropped_after].into_iter().flatten() {
                self.queue.clear(dropped.start, dropped.len);
            }
            let (new_before, new_after) = applied.difference(held);
            let tail = new_after.map(|r| (r.start, items.split_off(r.start - applied.start)));
            if let Some(before) = new_before {
                items.truncate(before.len);
                self.queue.set(before.start, items);
            }
            if let Some((start, tail)) = tail {
                self.queue.set(start, tail);
            }
        }
        self.viewport.set_visible(applied);
    }
}
