// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property-based invariant tests for `understory_paging`.
//!
//! ## Invariants
//!
//! 1. Convergence: against a dataset of size N, the communicated size ends at N.
//! 2. Exact counts are sticky under growth, estimates, and probe feedback.
//! 3. `should_grow` is never true for an exact count.
//! 4. Queue order: replaying batches (size first, then operations) rebuilds
//!    the array the enqueued operations describe, and no operation reaches
//!    past the batch size.
//! 5. Stale completions are no-ops.
//! 6. Client mirror: under any interleaving of requests, flushes, sends,
//!    acknowledgements, refreshes, mode switches, and source replacements,
//!    the client only ever holds rows of the current source.

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use understory_paging::{
    Completion, CountMode, CountStrategy, DataCommunicator, FetchResult, ItemCount, ItemRange,
    PagingConfig, UpdateBatch, UpdateOp, UpdateQueue, ViewportTracker,
};

// ── Strategies ────────────────────────────────────────────────────────────

fn arb_range(max_start: usize) -> impl Strategy<Value = ItemRange> {
    (0..max_start, 0_usize..120).prop_map(|(start, len)| ItemRange::new(start, len))
}

fn arb_probing_mode() -> impl Strategy<Value = CountMode> {
    prop_oneof![Just(CountMode::Estimate), Just(CountMode::Unknown)]
}

#[derive(Clone, Debug)]
enum Op {
    Size(usize),
    Set(usize, Vec<u8>),
    Clear(usize, usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0_usize..60).prop_map(Op::Size),
        (0_usize..60, prop::collection::vec(any::<u8>(), 0..8))
            .prop_map(|(start, items)| Op::Set(start, items)),
        (0_usize..60, 0_usize..10).prop_map(|(start, len)| Op::Clear(start, len)),
    ]
}

#[derive(Clone, Debug)]
enum Action {
    Request(usize, usize),
    Flush,
    Send,
    Acknowledge,
    Refresh,
    SwitchMode(CountMode),
    ReplaceSource(usize),
}

fn arb_mode() -> impl Strategy<Value = CountMode> {
    prop_oneof![
        Just(CountMode::Exact),
        Just(CountMode::Estimate),
        Just(CountMode::Unknown),
    ]
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => (0_usize..400, 0_usize..80).prop_map(|(start, len)| Action::Request(start, len)),
        3 => Just(Action::Flush),
        2 => Just(Action::Send),
        2 => Just(Action::Acknowledge),
        1 => Just(Action::Refresh),
        1 => arb_mode().prop_map(Action::SwitchMode),
        1 => (0_usize..300).prop_map(Action::ReplaceSource),
    ]
}

// ── Client mirror ─────────────────────────────────────────────────────────

/// Applies `batch` the way a client would, rejecting operations past the size.
fn replay<T: Clone>(
    rows: &mut Vec<Option<T>>,
    batch: &UpdateBatch<T>,
) -> Result<(), TestCaseError> {
    if let Some(size) = batch.size() {
        rows.resize(size, None);
    }
    for op in batch.ops() {
        match op {
            UpdateOp::Set { start, items } => {
                prop_assert!(
                    start + items.len() <= rows.len(),
                    "set {}..{} past size {}",
                    start,
                    start + items.len(),
                    rows.len()
                );
                for (row, item) in rows[*start..].iter_mut().zip(items) {
                    *row = Some(item.clone());
                }
            }
            UpdateOp::Clear { start, len } => {
                prop_assert!(
                    start + len <= rows.len(),
                    "clear {}..{} past size {}",
                    start,
                    start + len,
                    rows.len()
                );
                rows[*start..start + len].fill(None);
            }
        }
    }
    Ok(())
}

// ── 1. Convergence ────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn exact_mode_communicates_the_dataset_size(
        n in 0_usize..2000,
        ranges in prop::collection::vec(arb_range(2500), 1..12),
    ) {
        let mut rows: Vec<usize> = (0..n).collect();
        let config = PagingConfig::new().with_mode(CountMode::Exact);
        let mut dc = DataCommunicator::new(config).unwrap();
        for range in ranges {
            dc.request_range(range.start, range.len);
            dc.flush_with(&mut rows).unwrap();
            prop_assert_eq!(dc.item_count(), ItemCount::Exact(n));
            prop_assert!(dc.visible_range().end() <= n);
        }
    }

    #[test]
    fn probing_modes_find_the_end(
        n in 0_usize..1500,
        mode in arb_probing_mode(),
        page_size in 1_usize..80,
        ranges in prop::collection::vec(arb_range(2000), 0..8),
    ) {
        let mut rows: Vec<usize> = (0..n).collect();
        let config = PagingConfig::new().with_mode(mode).with_page_size(page_size);
        let mut dc = DataCommunicator::new(config).unwrap();
        for range in ranges {
            dc.request_range(range.start, range.len);
            dc.flush_with(&mut rows).unwrap();
            if let ItemCount::Exact(found) = dc.item_count() {
                prop_assert_eq!(found, n);
            }
        }
        // Scrolling across the end always settles the count.
        dc.request_range(n.saturating_sub(1), page_size + 1);
        dc.flush_with(&mut rows).unwrap();
        prop_assert_eq!(dc.item_count(), ItemCount::Exact(n));

        let mut last_size = None;
        let mut next = dc.take_batch();
        while let Some(batch) = next {
            last_size = batch.size().or(last_size);
            next = dc.confirm_update(batch.update_id());
        }
        prop_assert_eq!(last_size, Some(n));
    }
}

// ── 2. Exact is sticky ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn exact_count_survives_growth_and_estimates(
        end in 1_usize..500,
        ranges in prop::collection::vec(arb_range(5000), 0..10),
        estimates in prop::collection::vec(0_usize..10_000, 0..10),
    ) {
        let mut strategy = CountStrategy::new(&PagingConfig::new());
        strategy.observe(ItemRange::new(0, end + 1), end);
        prop_assert_eq!(strategy.count(), ItemCount::Exact(end));

        for range in ranges {
            strategy.grow_for(range, 50);
            strategy.observe(range, range.len / 2);
        }
        for estimate in estimates {
            strategy.set_estimate(estimate, 0);
        }
        prop_assert_eq!(strategy.count(), ItemCount::Exact(end));
    }
}

// ── 3. No growth for exact counts ─────────────────────────────────────────

proptest! {
    #[test]
    fn should_grow_is_false_for_exact(
        page_size in 1_usize..200,
        n in 0_usize..10_000,
        range in arb_range(20_000),
    ) {
        let tracker = ViewportTracker::new(page_size);
        prop_assert!(!tracker.should_grow(range, ItemCount::Exact(n)));
        prop_assert!(tracker.clamp_range(range, ItemCount::Exact(n)).end() <= n);
    }
}

// ── 4. Queue order ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn batches_rebuild_the_enqueued_array(
        initial in 0_usize..60,
        first in prop::collection::vec(arb_op(), 0..20),
        second in prop::collection::vec(arb_op(), 0..20),
    ) {
        let mut queue = UpdateQueue::new();
        let mut expected: Vec<Option<u8>> = Vec::new();
        let mut client: Vec<Option<u8>> = Vec::new();

        queue.update_size(initial);
        expected.resize(initial, None);
        let mut in_flight = None;
        for (phase, ops) in [first, second].into_iter().enumerate() {
            for op in ops {
                match op {
                    Op::Size(n) => {
                        queue.update_size(n);
                        expected.resize(n, None);
                    }
                    Op::Set(start, mut items) => {
                        items.truncate(expected.len().saturating_sub(start));
                        let expected_len = expected.len();
                        for (row, item) in expected[start.min(expected_len)..].iter_mut().zip(&items) {
                            *row = Some(*item);
                        }
                        queue.set(start, items);
                    }
                    Op::Clear(start, len) => {
                        let range = ItemRange::new(start, len).clamp_to(expected.len());
                        expected[range.to_range()].fill(None);
                        queue.clear(range.start, range.len);
                    }
                }
            }
            let batch = if phase == 0 {
                queue.commit()
            } else {
                in_flight.and_then(|id| queue.confirm(id))
            };
            if let Some(batch) = batch {
                replay(&mut client, &batch)?;
                in_flight = Some(batch.update_id());
            }
            prop_assert_eq!(&client, &expected);
        }
    }
}

// ── 5. Stale completions ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn late_results_for_superseded_requests_are_ignored(
        first in arb_range(150),
        second in arb_range(150),
    ) {
        prop_assume!(!first.is_empty() && first != second);
        let mut dc = DataCommunicator::<usize>::new(PagingConfig::new()).unwrap();
        let fill = |range: ItemRange| FetchResult::items(range.to_range().collect());

        dc.request_range(first.start, first.len);
        let r1 = dc.flush().unwrap();
        dc.request_range(second.start, second.len);
        let r2 = dc.flush();

        let Some(r2) = r2 else {
            // An empty second range was applied without a fetch.
            let late = dc.complete::<()>(r1.ticket, Ok(fill(r1.range))).unwrap();
            prop_assert_eq!(late, Completion::Stale);
            prop_assert_eq!(dc.visible_range().len, 0);
            return Ok(());
        };
        let applied = dc.complete::<()>(r2.ticket, Ok(fill(r2.range))).unwrap();
        let visible = dc.visible_range();
        let count = dc.item_count();
        prop_assert_eq!(applied, Completion::Applied { range: r2.range });

        let late = dc.complete::<()>(r1.ticket, Ok(fill(r1.range))).unwrap();
        prop_assert_eq!(late, Completion::Stale);
        prop_assert_eq!(dc.visible_range(), visible);
        prop_assert_eq!(dc.item_count(), count);
    }
}

// ── 6. Client mirror ──────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn client_only_holds_rows_of_the_current_source(
        mode in arb_mode(),
        initial_len in 0_usize..300,
        actions in prop::collection::vec(arb_action(), 1..40),
    ) {
        let mut generation = 0;
        let mut source: Vec<usize> = (0..initial_len).collect();
        let config = PagingConfig::new().with_mode(mode);
        let mut dc = DataCommunicator::new(config).unwrap();
        let mut client: Vec<Option<usize>> = Vec::new();
        let mut in_flight: Option<u64> = None;

        for action in actions {
            match action {
                Action::Request(start, len) => dc.request_range(start, len),
                Action::Flush => dc.flush_with(&mut source).unwrap(),
                Action::Send => {
                    if in_flight.is_none()
                        && let Some(batch) = dc.take_batch()
                    {
                        replay(&mut client, &batch)?;
                        in_flight = Some(batch.update_id());
                    }
                }
                Action::Acknowledge => {
                    if let Some(id) = in_flight.take()
                        && let Some(batch) = dc.confirm_update(id)
                    {
                        replay(&mut client, &batch)?;
                        in_flight = Some(batch.update_id());
                    }
                }
                Action::Refresh => dc.refresh_all(),
                Action::SwitchMode(mode) => dc.set_mode(mode),
                Action::ReplaceSource(len) => {
                    generation += 1;
                    let base = generation * 100_000;
                    source = (base..base + len).collect();
                    dc.reset();
                }
            }
        }

        dc.flush_with(&mut source).unwrap();
        let mut next = match in_flight {
            Some(id) => dc.confirm_update(id),
            None => dc.take_batch(),
        };
        while let Some(batch) = next {
            replay(&mut client, &batch)?;
            next = dc.confirm_update(batch.update_id());
        }

        prop_assert_eq!(client.len(), dc.size());
        for (index, row) in client.iter().enumerate() {
            if let Some(value) = row {
                prop_assert_eq!(Some(value), source.get(index), "stale row {}", index);
            }
        }
        for index in dc.visible_range().to_range() {
            prop_assert_eq!(client[index], Some(source[index]));
        }
    }
}
