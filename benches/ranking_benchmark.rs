use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kissbot_wows_stats::ranking::{closest_match, levenshtein_distance};

fn create_test_catalog(count: usize) -> Vec<(u64, String)> {
    const NAMES: [&str; 8] = [
        "Yamato", "Montana", "Grosser Kurfurst", "Conqueror",
        "Republique", "Shikishima", "Ohio", "Thunderer",
    ];
    (0..count)
        .map(|i| (i as u64, format!("{} {}", NAMES[i % NAMES.len()], i)))
        .collect()
}

fn bench_levenshtein(c: &mut Criterion) {
    c.bench_function("levenshtein_short", |b| {
        b.iter(|| black_box(levenshtein_distance(black_box("Yamato"), black_box("Yamatoo"))))
    });

    c.bench_function("levenshtein_long", |b| {
        b.iter(|| {
            black_box(levenshtein_distance(
                black_box("Grosser Kurfurst"),
                black_box("Großer Kurfürst"),
            ))
        })
    });
}

fn bench_closest_match(c: &mut Criterion) {
    let catalog_100 = create_test_catalog(100);
    let catalog_600 = create_test_catalog(600);

    c.bench_function("closest_match_100", |b| {
        b.iter(|| {
            black_box(closest_match(
                "Montanna 50",
                catalog_100.iter().map(|(id, name)| (*id, name.as_str())),
            ))
        });
    });

    c.bench_function("closest_match_600", |b| {
        b.iter(|| {
            black_box(closest_match(
                "Montanna 500",
                catalog_600.iter().map(|(id, name)| (*id, name.as_str())),
            ))
        });
    });
}

criterion_group!(benches, bench_levenshtein, bench_closest_match);
criterion_main!(benches);
