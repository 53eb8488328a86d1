use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use nlcmd::api::TranslationResult;
use nlcmd::history::HistoryStore;
use nlcmd::view::TranslationView;

/// Benchmark recording into a full in-memory history
fn bench_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("history_record");

    for limit in &[10usize, 50, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(limit), limit, |b, &limit| {
            let mut store = HistoryStore::in_memory(limit);
            for i in 0..limit {
                store.record(&format!("query {i}"), "ls -la", 0);
            }

            b.iter(|| {
                store.record(black_box("list all files"), black_box("ls -la"), 1);
            });
        });
    }

    group.finish();
}

/// Benchmark day grouping for the history panel
fn bench_grouping(c: &mut Criterion) {
    let mut group = c.benchmark_group("history_grouping");

    for limit in &[50usize, 500] {
        let mut store = HistoryStore::in_memory(*limit);
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for i in 0..*limit {
            let at = base + Duration::hours(i64::try_from(i).unwrap() * 5);
            store.record_at(&format!("query {i}"), "df -h", 0, at);
        }

        group.bench_with_input(BenchmarkId::from_parameter(limit), &store, |b, store| {
            b.iter(|| black_box(store.grouped_by_day_in(&Utc)));
        });
    }

    group.finish();
}

/// Benchmark decoding and viewing a typical translation body
fn bench_translation_view(c: &mut Criterion) {
    let body = serde_json::json!({
        "command": "find . -name '*.log' -mtime +7 -delete",
        "explanation": "Deletes log files older than a week",
        "breakdown": {
            "find .": "search from the current directory",
            "-name '*.log'": "match log files",
            "-mtime +7": "modified more than 7 days ago",
            "-delete": "remove each match"
        },
        "safety_warning": "This permanently deletes files",
        "risk_level": 3
    });

    c.bench_function("translation_view", |b| {
        b.iter(|| {
            let result = TranslationResult::from_value(black_box(&body)).unwrap();
            black_box(TranslationView::new(&result))
        });
    });
}

criterion_group!(benches, bench_record, bench_grouping, bench_translation_view);
criterion_main!(benches);
