//! Performance benchmarks for ca-session
//!
//! Run with: cargo bench

use ca_session::provider::mock::MockProvider;
use ca_session::{format_notification, CaSession, Notification, PvValue};
use criterion::{criterion_group, criterion_main, Criterion};

fn bench_cached_get(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    // Pre-resolve so every iteration is a cache hit
    let session = rt.block_on(async {
        let provider = MockProvider::default();
        provider.register("BENCH:PV", PvValue::Double(7.35));
        let session = CaSession::new(provider);
        session.get("BENCH:PV").await.unwrap();
        session
    });

    c.bench_function("get (cache hit)", |b| {
        b.to_async(&rt)
            .iter(|| async { session.get("BENCH:PV").await.unwrap() });
    });
}

fn bench_miss_path_resolution(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("resolve (cache miss)", |b| {
        b.to_async(&rt).iter(|| async {
            let provider = MockProvider::default();
            provider.register("BENCH:PV", PvValue::Double(7.35));
            let session = CaSession::new(provider);
            session.resolve("BENCH:PV").await.unwrap()
        });
    });
}

fn bench_notification_formatting(c: &mut Criterion) {
    let notification = Notification::new(
        "XPP:GON:X.VAL",
        PvValue::Double(1.23456),
        Some("1.235".to_string()),
    );

    c.bench_function("format_notification", |b| {
        b.iter(|| format_notification(&notification));
    });
}

criterion_group!(
    benches,
    bench_cached_get,
    bench_miss_path_resolution,
    bench_notification_formatting,
);
criterion_main!(benches);
