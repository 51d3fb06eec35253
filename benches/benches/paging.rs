// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use understory_paging::{CountMode, DataCommunicator, PagingConfig, UpdateQueue};

#[derive(Clone)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u32(&mut self) -> u32 {
        // Numerical Recipes LCG parameters.
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 32) as u32
    }

    fn gen_range_usize(&mut self, upper_exclusive: usize) -> usize {
        if upper_exclusive == 0 {
            return 0;
        }
        (self.next_u32() as usize) % upper_exclusive
    }
}

/// Scroll offsets moving forward by small steps, like a wheel.
fn smooth_scroll(steps: usize, stride: usize) -> Vec<usize> {
    (0..steps).map(|i| i * stride).collect()
}

/// Scroll offsets jumping anywhere in `0..rows`, like dragging a scrollbar.
fn random_jumps(steps: usize, rows: usize, seed: u64) -> Vec<usize> {
    let mut rng = Lcg::new(seed);
    (0..steps).map(|_| rng.gen_range_usize(rows)).collect()
}

/// Drives a communicator through `offsets` and drains every batch.
fn run_session(mode: CountMode, rows: &mut Vec<u32>, offsets: &[usize], window: usize) -> usize {
    let config = PagingConfig::new().with_mode(mode);
    let Ok(mut communicator) = DataCommunicator::new(config) else {
        return 0;
    };
    let mut ops = 0;
    for &offset in offsets {
        communicator.request_range(offset, window);
        if communicator.flush_with(rows).is_err() {
            break;
        }
        let mut next = communicator.take_batch();
        while let Some(batch) = next {
            ops += batch.ops().len();
            next = communicator.confirm_update(batch.update_id());
        }
    }
    ops
}

fn bench_communicator(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_paging/communicator");
    group.sample_size(50);

    for &rows in &[10_000_usize, 1_000_000_usize] {
        let smooth = smooth_scroll(500, 3);
        let jumps = random_jumps(500, rows + rows / 10, 0x9A61_0000_0000_0001);

        for (mode, label) in [
            (CountMode::Exact, "exact"),
            (CountMode::Estimate, "estimate"),
            (CountMode::Unknown, "unknown"),
        ] {
            group.bench_function(format!("smooth_scroll(rows={rows},mode={label})"), |b| {
                b.iter_batched(
                    || (0..rows as u32).collect::<Vec<u32>>(),
                    |mut data| black_box(run_session(mode, &mut data, &smooth, 50)),
                    BatchSize::LargeInput,
                );
            });

            group.bench_function(format!("random_jumps(rows={rows},mode={label})"), |b| {
                b.iter_batched(
                    || (0..rows as u32).collect::<Vec<u32>>(),
                    |mut data| black_box(run_session(mode, &mut data, &jumps, 50)),
                    BatchSize::LargeInput,
                );
            });
        }
    }

    group.finish();
}

fn bench_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_paging/queue");

    for &ops in &[16_usize, 256_usize] {
        group.bench_function(format!("commit_confirm(ops={ops})"), |b| {
            b.iter(|| {
                let mut queue = UpdateQueue::new();
                let mut sent = 0;
                for i in 0..ops {
                    queue.update_size(i * 10);
                    queue.clear(i, 1);
                    queue.set(i, vec![i as u32; 4]);
                    if i % 4 == 3 {
                        let mut next = queue.commit();
                        while let Some(batch) = next {
                            sent += batch.ops().len();
                            next = queue.confirm(batch.update_id());
                        }
                    }
                }
                black_box(sent)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_communicator, bench_queue);
criterion_main!(benches);
