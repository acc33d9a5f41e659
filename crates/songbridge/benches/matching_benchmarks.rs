//! Normalization, similarity, and reconciliation benchmarks.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use songbridge::catalog::memory::InMemoryCatalog;
use songbridge::matching::token_set_ratio;
use songbridge::{
    CancellationToken, CatalogTrack, Platform, RawItem, ReconcileOptions, Songbridge, SyncMode,
    TitleNormalizer,
};

const LABELS: &[&str] = &[
    "Perfect - Ed Sheeran (Official Music Video)",
    "Badhulu Thochanai Song With Lyrics - Mr. Perfect Songs - Prabhas, Kajal Aggarwal, DSP",
    "Tum Hi Ho | Aashiqui 2 | Arijit Singh | Full Video Song [HD]",
    "Coldplay - Yellow (Official Video)",
    "Kesariya - Brahmastra | Ranbir Kapoor | Alia Bhatt | Pritam | Arijit Singh",
    "Levitating",
];

/// Generate a catalog and matching playlist of `size` songs.
fn generate_library(size: usize) -> (InMemoryCatalog, Vec<RawItem>) {
    let titles = ["Yellow", "Perfect", "Tum Hi Ho", "Kesariya", "Levitating", "Clocks"];
    let artists = ["Coldplay", "Ed Sheeran", "Arijit Singh", "Pritam", "Dua Lipa"];

    let mut catalog = InMemoryCatalog::default();
    let mut items = Vec::with_capacity(size);
    for i in 0..size {
        let title = format!("{} {}", titles[i % titles.len()], i);
        let artist = artists[i % artists.len()];
        catalog = catalog.with_track(CatalogTrack::new(format!("t{}", i), title.clone(), artist));
        items.push(RawItem::new(
            format!("{} - {} (Official Video)", title, artist),
            Platform::Video,
            format!("v{}", i),
        ));
    }
    (catalog, items)
}

fn bench_normalizer(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalizer");
    let normalizer = TitleNormalizer::new();

    group.bench_function("creation", |b| b.iter(|| black_box(TitleNormalizer::new())));

    for (i, label) in LABELS.iter().enumerate() {
        group.throughput(Throughput::Bytes(label.len() as u64));
        group.bench_with_input(BenchmarkId::new("label", i), label, |b, label| {
            b.iter(|| black_box(normalizer.normalize(label, None)))
        });
    }

    group.finish();
}

fn bench_similarity(c: &mut Criterion) {
    let mut group = c.benchmark_group("similarity");

    group.bench_function("identical", |b| {
        b.iter(|| black_box(token_set_ratio("Badhulu Thochanai", "Badhulu Thochanai")))
    });
    group.bench_function("partial_overlap", |b| {
        b.iter(|| black_box(token_set_ratio("Tum Hi Ho Unplugged", "Tum Hi Ho Reprise")))
    });
    group.bench_function("long_labels", |b| {
        b.iter(|| black_box(token_set_ratio(LABELS[1], LABELS[4])))
    });

    group.finish();
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");
    group.sample_size(20);

    for size in [10, 100, 500].iter() {
        let (catalog, items) = generate_library(*size);
        let engine = Songbridge::new().with_catalog(catalog);
        let options = ReconcileOptions::new(SyncMode::Mirror);

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("items", size), &items, |b, items| {
            b.iter(|| {
                black_box(engine.reconcile(items, Vec::new(), &options, &CancellationToken::new()))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_normalizer, bench_similarity, bench_reconcile);
criterion_main!(benches);
