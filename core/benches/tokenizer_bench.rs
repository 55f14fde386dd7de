use criterion::{criterion_group, criterion_main, Criterion};
use staysearch_core::tokenizer::normalize;
use staysearch_core::{build, CatalogEntry, IndexConfig, Measure};

const NAMES: &[&str] = &[
    "Cozy seaside apartment with sea view",
    "Modern city loft near the cathedral",
    "Seaside villa with private pool and garden",
    "Charming studio in the historic centre",
    "Renovated farmhouse surrounded by olive trees",
    "Bright two bedroom flat with terrace",
];

fn bench_normalize(c: &mut Criterion) {
    let text = NAMES.join(". ");
    c.bench_function("normalize_listing_names", |b| b.iter(|| normalize(&text)));
}

fn bench_rank(c: &mut Criterion) {
    let corpus: Vec<CatalogEntry> = (0..5_000)
        .map(|i| CatalogEntry::named(i.to_string(), NAMES[i % NAMES.len()]))
        .collect();
    let generation = build(corpus, &IndexConfig::default());
    c.bench_function("rank_cosine_top10", |b| {
        b.iter(|| staysearch_core::rank(&generation, "seaside apartment with terrace", Measure::Cosine, 10))
    });
}

criterion_group!(benches, bench_normalize, bench_rank);
criterion_main!(benches);
