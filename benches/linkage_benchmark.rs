use aq_linker::config::LinkerConfig;
use aq_linker::linkage::{normalize, ratio, CityMatcher, Scorer};
use aq_linker::models::{GazetteerRecord, MeasurementRecord};
use aq_linker::processors::LinkagePipeline;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use indexmap::IndexSet;

const SYLLABLES: [&str; 12] = [
    "ber", "lin", "par", "is", "mad", "rid", "ro", "ma", "lon", "don", "vie", "nna",
];

// Deterministic pseudo city names
fn city_name(i: usize) -> String {
    let mut name = String::new();
    let mut n = i;
    for _ in 0..3 {
        name.push_str(SYLLABLES[n % SYLLABLES.len()]);
        n /= SYLLABLES.len();
    }
    format!("{}{}", name, i % 7)
}

fn create_test_tables(cities: usize) -> (Vec<MeasurementRecord>, Vec<GazetteerRecord>) {
    let gazetteer = (0..cities)
        .map(|i| {
            GazetteerRecord::new(
                city_name(i),
                "FR",
                Some(40.0 + (i % 100) as f64 * 0.1),
                Some(2.0 + (i % 50) as f64 * 0.1),
            )
        })
        .collect();

    // Every other measurement city carries a typo
    let measurements = (0..cities)
        .map(|i| {
            let mut city = city_name(i);
            if i % 2 == 0 {
                city.insert(1, 'x');
            }
            MeasurementRecord::new("France", city, 50.0, 20.0, 10.0, 5.0)
        })
        .collect();

    (measurements, gazetteer)
}

fn benchmark_scorers(c: &mut Criterion) {
    let pairs = [
        ("parris", "paris"),
        ("newyork", "newark"),
        ("saintetienne", "sainteetienne"),
        ("zzzqqq", "newyork"),
    ];

    for scorer in [Scorer::Ratio, Scorer::Levenshtein, Scorer::JaroWinkler] {
        c.bench_function(&format!("score_{}", scorer), |b| {
            b.iter(|| {
                let total: f64 = pairs.iter().map(|(a, z)| scorer.score(a, z)).sum();
                black_box(total)
            })
        });
    }

    c.bench_function("ratio_long_names", |b| {
        b.iter(|| black_box(ratio("llanfairpwllgwyngyll", "llanfairpwllgwyngyllgogery")))
    });
}

fn benchmark_normalize(c: &mut Criterion) {
    let names = ["Saint-Étienne", "New York City", "Frankfurt am Main", "São Paulo"];

    c.bench_function("normalize", |b| {
        b.iter(|| {
            let total: usize = names.iter().map(|n| normalize(n).len()).sum();
            black_box(total)
        })
    });
}

fn benchmark_matcher_by_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_cities_by_size");
    group.sample_size(10);

    for &size in &[100, 500, 2000] {
        let (measurements, gazetteer) = create_test_tables(size);
        let sources: IndexSet<String> = measurements.iter().map(|m| normalize(&m.city)).collect();
        let candidates: IndexSet<String> = gazetteer.iter().map(|g| normalize(&g.city)).collect();

        group.bench_with_input(BenchmarkId::new("cities", size), &size, |b, _| {
            let matcher = CityMatcher::new();
            b.iter(|| {
                let mapping = matcher.match_cities(&sources, &candidates, None);
                black_box(mapping.map(|m| m.len()).unwrap_or(0))
            })
        });
    }

    group.finish();
}

fn benchmark_link_tables(c: &mut Criterion) {
    let (measurements, gazetteer) = create_test_tables(500);
    let pipeline = LinkagePipeline::new(LinkerConfig::default());

    c.bench_function("link_tables_500", |b| {
        b.iter(|| {
            let outcome = pipeline.link_tables(&measurements, &gazetteer, None);
            black_box(outcome.map(|o| o.table.len()).unwrap_or(0))
        })
    });
}

criterion_group!(
    benches,
    benchmark_scorers,
    benchmark_normalize,
    benchmark_matcher_by_size,
    benchmark_link_tables
);
criterion_main!(benches);
