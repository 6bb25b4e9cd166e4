// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Studio Ledger Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Benchmarks for the job ledger.
//!
//! Run with: cargo bench
//!
//! Benchmarks include:
//! - Single-threaded job creation and lifecycle transitions
//! - Multi-threaded job creation racing on the receipt counter
//! - Statistics projection over growing job sets

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rayon::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;
use studio_ledger_rs::{
    Actor, JobDraft, JobLedger, MemoryStore, NullNotifier, PayMethod, TextReceipt,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn ledger() -> JobLedger<MemoryStore, NullNotifier, TextReceipt> {
    JobLedger::new(MemoryStore::new(), NullNotifier, TextReceipt::default())
}

fn draft(n: usize) -> JobDraft {
    JobDraft {
        customer_name: format!("Customer {n}"),
        total_cost: Some(Decimal::new(200_000, 2)),
        advance: Some(Decimal::new(50_000, 2)),
        pay_method: if n % 2 == 0 {
            PayMethod::Cash
        } else {
            PayMethod::Card
        },
        ..Default::default()
    }
}

// =============================================================================
// Single-Threaded Benchmarks
// =============================================================================

fn bench_single_create(c: &mut Criterion) {
    c.bench_function("single_create", |b| {
        let ledger = ledger();
        let admin = Actor::admin("owner");
        let mut n = 0usize;
        b.iter(|| {
            n += 1;
            ledger.create(&admin, black_box(&draft(n)), false).unwrap();
        })
    });
}

fn bench_full_lifecycle(c: &mut Criterion) {
    c.bench_function("full_lifecycle", |b| {
        let ledger = ledger();
        let admin = Actor::admin("owner");
        let staff = Actor::staff("assistant");
        let mut n = 0usize;
        b.iter(|| {
            n += 1;
            let id = ledger.create(&admin, &draft(n), false).unwrap().job.id;
            ledger.mark_ready(&staff, &id).unwrap();
            ledger
                .complete(&admin, &id, Some(PayMethod::Card))
                .unwrap();
        })
    });
}

fn bench_create_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_throughput");

    for count in [100, 1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter(|| {
                let ledger = ledger();
                let admin = Actor::admin("owner");
                for n in 0..count {
                    ledger.create(&admin, &draft(n), false).unwrap();
                }
                black_box(&ledger);
            })
        });
    }
    group.finish();
}

// =============================================================================
// Statistics Benchmarks
// =============================================================================

fn bench_stats_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("stats_projection");

    // Projection always walks the full job set, so cost grows with history.
    for count in [100, 1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let ledger = ledger();
            let admin = Actor::admin("owner");
            for n in 0..count {
                let id = ledger.create(&admin, &draft(n), false).unwrap().job.id;
                if n % 3 == 0 {
                    ledger
                        .complete(&admin, &id, Some(PayMethod::Cash))
                        .unwrap();
                }
            }

            b.iter(|| black_box(ledger.stats().unwrap()))
        });
    }
    group.finish();
}

// =============================================================================
// Multi-Threaded Benchmarks
// =============================================================================

fn bench_parallel_creates(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_creates");

    // Every create races on the single receipt counter, so this measures the
    // allocator's retry loop under contention.
    for count in [100, 1_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter(|| {
                let ledger = Arc::new(ledger());
                let admin = Actor::admin("owner");

                (0..count).into_par_iter().for_each(|n| {
                    ledger.create(&admin, &draft(n), false).unwrap();
                });

                black_box(&ledger);
            })
        });
    }
    group.finish();
}

fn bench_thread_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("thread_scaling");
    let total_jobs = 1_000usize;

    for num_threads in [1, 2, 4, 8].iter() {
        group.throughput(Throughput::Elements(total_jobs as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(num_threads),
            num_threads,
            |b, &num_threads| {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .build()
                    .unwrap();

                b.iter(|| {
                    let ledger = Arc::new(ledger());
                    let admin = Actor::admin("owner");

                    pool.install(|| {
                        (0..total_jobs).into_par_iter().for_each(|n| {
                            ledger.create(&admin, &draft(n), false).unwrap();
                        });
                    });

                    black_box(&ledger);
                })
            },
        );
    }
    group.finish();
}

// =============================================================================
// Criterion Groups
// =============================================================================

criterion_group!(
    single_threaded,
    bench_single_create,
    bench_full_lifecycle,
    bench_create_throughput,
);

criterion_group!(statistics, bench_stats_projection,);

criterion_group!(multi_threaded, bench_parallel_creates, bench_thread_scaling,);

criterion_main!(single_threaded, statistics, multi_threaded);
